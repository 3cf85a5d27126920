use crate::recreate;
use lynx::{AsValue, Connection, Entity, Session, Value};

#[derive(Entity, Default, Debug, PartialEq)]
struct Attachment {
    id: Option<i32>,
    name: Option<String>,
    content: Option<Vec<u8>>,
}

/// Binary values, bound as parameters and written as literals.
pub fn attachment(connection: &mut dyn Connection) {
    recreate(
        connection,
        "attachment",
        "id INTEGER PRIMARY KEY, name VARCHAR(80), content BLOB",
    );
    let mut session = Session::managed(connection);
    let png = vec![0x89, b'P', b'N', b'G', 0x00, 0xFF, 0x0A];
    assert_eq!(
        session
            .execute(
                "INSERT INTO attachment (id, name, content) VALUES (?1, ?2, ?3)",
                &[
                    Value::Int32(Some(1)),
                    Value::Varchar(Some("logo.png".into())),
                    png.clone().as_value(),
                ],
            )
            .expect("Failed to insert the attachment"),
        1
    );
    let mut found = Attachment {
        id: Some(1),
        ..Default::default()
    };
    assert!(session.select(&mut found).expect("Failed to select"));
    assert_eq!(found.content.as_deref(), Some(&png[..]));

    let mut empty = Attachment {
        id: Some(2),
        name: Some("empty.bin".into()),
        content: Some(Vec::new()),
    };
    session.insert(&mut empty).expect("Failed to insert");
    let mut copy = Attachment {
        id: Some(3),
        name: Some("copy.png".into()),
        content: found.content.clone(),
    };
    session.insert(&mut copy).expect("Failed to insert");
    let attachments = session
        .list_of::<Attachment>(
            "SELECT * FROM attachment WHERE content = ?1 ORDER BY id",
            &[png.as_value()],
        )
        .expect("Failed to list the attachments");
    assert_eq!(
        attachments.iter().map(|v| v.id).collect::<Vec<_>>(),
        [Some(1), Some(3)]
    );
    let mut found = Attachment {
        id: Some(2),
        ..Default::default()
    };
    assert!(session.select(&mut found).expect("Failed to select"));
    assert_eq!(found.content, Some(Vec::new()));
}
