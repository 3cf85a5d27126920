use crate::recreate;
use lynx::{Connection, Entity, Session};
use time::{Date, macros::date};

#[derive(Entity, Default, Debug, PartialEq)]
struct Person {
    id: Option<i32>,
    last_name: Option<String>,
    first_name: Option<String>,
    born: Option<Date>,
    active: Option<bool>,
    #[lynx(exclude)]
    nickname: Option<String>,
}

pub fn person(connection: &mut dyn Connection) {
    recreate(
        connection,
        "person",
        "id INTEGER PRIMARY KEY, last_name VARCHAR(60), first_name VARCHAR(60), \
         born DATE, active BOOLEAN, nickname VARCHAR(60)",
    );
    let mut session = Session::managed(connection);

    // Insert
    let mut entity = Person {
        id: Some(42),
        last_name: Some("Smith".into()),
        first_name: Some("Ada".into()),
        born: Some(date!(1970 - 01 - 01)),
        active: Some(true),
        nickname: Some("not stored".into()),
    };
    assert_eq!(
        session.insert(&mut entity).expect("Failed to insert person 42"),
        1
    );
    assert_eq!(entity.id, Some(42));

    // Select
    let mut found = Person {
        id: Some(42),
        ..Default::default()
    };
    assert!(session.select(&mut found).expect("Failed to select person 42"));
    assert_eq!(
        found,
        Person {
            id: Some(42),
            last_name: Some("Smith".into()),
            first_name: Some("Ada".into()),
            born: Some(date!(1970 - 01 - 01)),
            active: Some(true),
            nickname: None,
        }
    );

    // Update
    found.last_name = Some("O'Hara".into());
    found.active = Some(false);
    assert_eq!(
        session.update(&mut found).expect("Failed to update person 42"),
        1
    );
    let mut found = Person {
        id: Some(42),
        ..Default::default()
    };
    assert!(session.select(&mut found).expect("Failed to select person 42"));
    assert_eq!(found.last_name.as_deref(), Some("O'Hara"));
    assert_eq!(found.first_name.as_deref(), Some("Ada"));
    assert_eq!(found.active, Some(false));

    // Missing row
    let mut missing = Person {
        id: Some(43),
        last_name: Some("Untouched".into()),
        ..Default::default()
    };
    assert!(!session.select(&mut missing).expect("Failed to select person 43"));
    assert_eq!(missing.last_name.as_deref(), Some("Untouched"));
    assert_eq!(
        session.update(&mut missing).expect("Failed to update person 43"),
        0
    );

    // Delete
    assert!(session.delete(&mut found).expect("Failed to delete person 42"));
    assert!(!session.delete(&mut found).expect("Failed to delete person 42 again"));
    let mut found = Person {
        id: Some(42),
        ..Default::default()
    };
    assert!(!session.select(&mut found).expect("Failed to select person 42"));
}
