use crate::{
    RecordingConnection,
    fruit::{FRUIT_TABLE, Fruit},
    recreate,
};
use lynx::{Connection, Session};

pub fn nullability(connection: &mut dyn Connection) {
    recreate(connection, "fruit", FRUIT_TABLE);

    // Null properties are left out, the column default applies
    let mut recording = RecordingConnection::new(connection);
    {
        let mut session = Session::managed(&mut recording);
        assert!(!session.keep_nulls());
        let mut kiwi = Fruit {
            id: Some(1),
            name: Some("Kiwi".into()),
            description: None,
        };
        session.insert(&mut kiwi).expect("Failed to insert the kiwi");
        let mut found = Fruit {
            id: Some(1),
            ..Default::default()
        };
        assert!(session.select(&mut found).expect("Failed to select the kiwi"));
        assert_eq!(found.description.as_deref(), Some("none"));
    }
    assert!(!recording.statements[0].contains("description"));

    // Null properties are written as NULL, and so is the empty string
    let mut recording = RecordingConnection::new(connection);
    {
        let mut session = Session::managed(&mut recording).save_nulls(true);
        let mut lime = Fruit {
            id: Some(2),
            name: Some("Lime".into()),
            description: None,
        };
        session.insert(&mut lime).expect("Failed to insert the lime");
        let mut plum = Fruit {
            id: Some(3),
            name: Some("Plum".into()),
            description: Some(String::new()),
        };
        session.insert(&mut plum).expect("Failed to insert the plum");
        for id in [2, 3] {
            let mut found = Fruit {
                id: Some(id),
                ..Default::default()
            };
            assert!(session.select(&mut found).expect("Failed to select"));
            assert_eq!(found.description, None);
        }

        // Clearing a value through update
        let mut kiwi = Fruit {
            id: Some(1),
            name: Some("Kiwi".into()),
            description: None,
        };
        assert_eq!(session.update(&mut kiwi).expect("Failed to update"), 1);
        let mut found = Fruit {
            id: Some(1),
            ..Default::default()
        };
        assert!(session.select(&mut found).expect("Failed to select"));
        assert_eq!(found.description, None);
    }
    assert!(recording.statements[0].contains("description"));
    assert!(recording.statements[0].contains("NULL"));
}
