use crate::recreate;
use lynx::{Connection, Entity, Session, Value};

#[derive(Entity, Default, Debug)]
#[lynx(name = "item")]
struct Item {
    id: Option<i64>,
    label: Option<String>,
}

/// Rows written by triggers are not part of the rows affected.
pub fn trigger(connection: &mut dyn Connection) {
    recreate(connection, "item_audit", "event VARCHAR(10), item_id INTEGER");
    recreate(connection, "item", "id INTEGER PRIMARY KEY, label VARCHAR(40)");
    for (event, row) in [("insert", "NEW"), ("update", "NEW"), ("delete", "OLD")] {
        assert_eq!(
            connection
                .execute_params(
                    &format!(
                        "CREATE TRIGGER item_{event} AFTER {} ON item BEGIN \
                         INSERT INTO item_audit VALUES ('{event}', {row}.id); \
                         INSERT INTO item_audit VALUES ('{event}', {row}.id); END",
                        event.to_uppercase()
                    ),
                    &[],
                )
                .expect("Failed to create the trigger"),
            0
        );
    }
    let mut session = Session::managed(&mut *connection);

    let mut item = Item {
        id: Some(1),
        label: Some("Lamp".into()),
    };
    assert_eq!(session.insert(&mut item).expect("Failed to insert"), 1);
    let mut generated = Item {
        id: None,
        label: Some("Desk".into()),
    };
    assert_eq!(session.insert(&mut generated).expect("Failed to insert"), 1);
    assert_eq!(generated.id, Some(2));

    item.label = Some("Floor lamp".into());
    assert_eq!(session.update(&mut item).expect("Failed to update"), 1);
    assert!(session.delete(&mut item).expect("Failed to delete"));
    assert!(!session.delete(&mut item).expect("Failed to delete again"));

    assert_eq!(
        session
            .execute("DELETE FROM item WHERE id = ?1", &[Value::Int64(generated.id)])
            .expect("Failed to delete"),
        1
    );
    assert_eq!(
        session
            .execute("SELECT COUNT(*) FROM item_audit", &[])
            .expect("Failed to count"),
        0
    );
    drop(session);

    let audit = connection
        .query("SELECT COUNT(*) FROM item_audit", &[])
        .expect("Failed to count the audit rows");
    assert_eq!(audit.rows[0][0], Value::Int64(Some(10)));
}
