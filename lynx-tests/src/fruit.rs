use crate::recreate;
use lynx::{Connection, Entity, Saved, Session, Value};

#[derive(Entity, Default, Debug, Clone, PartialEq)]
pub(crate) struct Fruit {
    pub(crate) id: Option<i32>,
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
}

pub(crate) const FRUIT_TABLE: &str =
    "id INTEGER PRIMARY KEY, name VARCHAR(40), description VARCHAR(200) DEFAULT 'none'";

pub fn fruit(connection: &mut dyn Connection) {
    recreate(connection, "fruit", FRUIT_TABLE);
    let mut session = Session::managed(connection);

    let mut apple = Fruit {
        id: Some(1),
        name: Some("Apple".into()),
        description: Some("Red".into()),
    };
    assert_eq!(
        session.save(&mut apple).expect("Failed to save the apple"),
        Saved::Inserted(1)
    );
    apple.name = Some("Gala".into());
    assert_eq!(
        session.save(&mut apple).expect("Failed to save the apple again"),
        Saved::Updated(1)
    );
    let fruits = session
        .list_of::<Fruit>(
            "SELECT * FROM fruit WHERE id = ?1",
            &[Value::Int32(Some(1))],
        )
        .expect("Failed to list the fruits");
    assert_eq!(fruits, [apple.clone()]);

    // Without a key value the entity is inserted and gets one
    let mut pear = Fruit {
        id: None,
        name: Some("Pear".into()),
        description: None,
    };
    let mut bound = session.bind(&mut pear);
    assert_eq!(
        bound.save().expect("Failed to save the pear"),
        Saved::Inserted(1)
    );
    assert!(bound.entity().id.is_some_and(|v| v > 1));
    bound.entity_mut().description = Some("Green".into());
    assert_eq!(
        bound.save().expect("Failed to save the pear again"),
        Saved::Updated(1)
    );
    assert_eq!(
        session
            .execute("SELECT 1 FROM fruit", &[])
            .expect("Failed to run a query through execute"),
        0
    );
    let count = session
        .list_of::<Fruit>("SELECT * FROM fruit ORDER BY id", &[])
        .expect("Failed to list the fruits");
    assert_eq!(count.len(), 2);
    assert_eq!(count[1].description.as_deref(), Some("Green"));
}
