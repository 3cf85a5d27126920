use crate::{RecordingConnection, recreate};
use lynx::{Connection, Entity, Error, Session};

#[derive(Entity, Default, Debug)]
struct Account {
    id: Option<i64>,
    owner: Option<String>,
    #[lynx(exclude)]
    balance: Option<i64>,
}

/// Invalid requests fail before any statement reaches the database.
pub fn validation(connection: &mut dyn Connection) {
    recreate(
        connection,
        "account",
        "id INTEGER PRIMARY KEY, owner VARCHAR(40), balance INTEGER DEFAULT 0",
    );
    let mut recording = RecordingConnection::new(connection);
    {
        let mut session = Session::managed(&mut recording);
        let mut account = Account {
            id: None,
            owner: Some("Grace".into()),
            balance: Some(100),
        };
        let error = session.update(&mut account).unwrap_err();
        assert!(matches!(error, Error::Validation(..)), "{:?}", error);
        assert!(session.delete(&mut account).unwrap_err().is_validation());
        assert!(session.select(&mut account).unwrap_err().is_validation());

        // Only the key would be written
        let mut keyed = Account {
            id: Some(1),
            owner: None,
            balance: Some(10),
        };
        assert!(session.update(&mut keyed).unwrap_err().is_validation());
    }
    assert!(recording.statements.is_empty(), "{:?}", recording.statements);

    let mut session = Session::managed(connection);
    let mut account = Account {
        id: None,
        owner: Some("Grace".into()),
        balance: Some(100),
    };
    session.insert(&mut account).expect("Failed to insert");
    let mut found = Account {
        id: account.id,
        ..Default::default()
    };
    assert!(session.select(&mut found).expect("Failed to select"));
    assert_eq!(found.owner.as_deref(), Some("Grace"));
    // Excluded from writes, still read back
    assert_eq!(found.balance, Some(0));
}
