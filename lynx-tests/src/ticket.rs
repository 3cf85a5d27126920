use crate::recreate;
use lynx::{Connection, Entity, Session};

#[derive(Entity, Default, Debug)]
#[lynx(name = "ticket")]
struct SupportTicket {
    #[lynx(name = "ticket_id")]
    id: Option<i64>,
    title: Option<String>,
}

/// Keys generated by the database are written back into the entity.
pub fn ticket(connection: &mut dyn Connection) {
    recreate(
        connection,
        "ticket",
        "ticket_id INTEGER PRIMARY KEY AUTOINCREMENT, title VARCHAR(80) NOT NULL",
    );
    let mut session = Session::managed(connection);

    let mut first = SupportTicket {
        id: None,
        title: Some("Printer on fire".into()),
    };
    assert_eq!(session.insert(&mut first).expect("Failed to insert"), 1);
    let first_id = first.id.expect("The generated key was not written back");
    assert!(first_id > 0);

    let mut second = SupportTicket {
        id: None,
        title: Some("Coffee machine empty".into()),
    };
    session.insert(&mut second).expect("Failed to insert");
    let second_id = second.id.expect("The generated key was not written back");
    assert!(second_id > first_id);

    let mut found = SupportTicket {
        id: Some(second_id),
        title: None,
    };
    assert!(session.select(&mut found).expect("Failed to select"));
    assert_eq!(found.title.as_deref(), Some("Coffee machine empty"));

    // Insert after a failed one still works
    let mut invalid = SupportTicket::default();
    crate::silent_logs! {
        let error = session
            .insert(&mut invalid)
            .expect_err("A null title must violate the constraint");
        assert!(matches!(error, lynx::Error::SqlExecution { .. }));
    }
    assert_eq!(invalid.id, None);
    let mut third = SupportTicket {
        id: None,
        title: Some("Third".into()),
    };
    session.insert(&mut third).expect("Failed to insert");
    assert!(third.id.is_some_and(|v| v > second_id));
}
