use crate::{RecordingConnection, recreate};
use lynx::{Connection, Entity, Registry, Session};
use std::sync::Arc;

#[derive(Entity, Default, Debug)]
#[lynx(name = "ENROLLMENT")]
struct Enrollment {
    student: Option<i32>,
    course: Option<String>,
    grade: Option<String>,
}

#[derive(Entity, Default, Debug)]
#[lynx(name = "audit_log")]
struct AuditLog {
    message: Option<String>,
}

pub fn primary_key(connection: &mut dyn Connection) {
    recreate(
        connection,
        "ENROLLMENT",
        "student INTEGER, course VARCHAR(20), grade VARCHAR(2), PRIMARY KEY (course, student)",
    );
    recreate(connection, "audit_log", "message TEXT");
    let identity = connection.metadata().identity.clone();
    let registry = Arc::new(Registry::new());
    let mut recording = RecordingConnection::new(connection);
    {
        let mut session = Session::managed(&mut recording).with_registry(registry.clone());
        let mut enrollment = Enrollment {
            student: Some(7),
            course: Some("MATH".into()),
            grade: Some("B".into()),
        };
        session.insert(&mut enrollment).expect("Failed to insert");
        enrollment.grade = Some("A".into());
        assert_eq!(session.update(&mut enrollment).expect("Failed to update"), 1);
        let mut found = Enrollment {
            student: Some(7),
            course: Some("MATH".into()),
            grade: None,
        };
        assert!(session.select(&mut found).expect("Failed to select"));
        assert_eq!(found.grade.as_deref(), Some("A"));

        // Composite key, both columns needed
        let mut partial = Enrollment {
            student: Some(7),
            course: None,
            grade: None,
        };
        crate::silent_logs! {
            assert!(session.select(&mut partial).unwrap_err().is_validation());
        }
    }
    assert_eq!(recording.primary_key_queries, 1);
    assert_eq!(
        registry.cached_primary_key(&identity, "ENROLLMENT").as_deref(),
        Some(&["course".to_string(), "student".to_string()][..])
    );
    assert!(
        recording
            .statements
            .iter()
            .any(|v| v.ends_with("WHERE course = 'MATH' AND student = 7"))
    );

    // A table without key has nothing cached, every lookup asks again
    let mut recording = RecordingConnection::new(connection);
    {
        let mut session = Session::managed(&mut recording).with_registry(registry.clone());
        let mut log = AuditLog {
            message: Some("started".into()),
        };
        crate::silent_logs! {
            assert_eq!(session.insert(&mut log).expect("Failed to insert"), 1);
            assert_eq!(log.message.as_deref(), Some("started"));
            assert!(session.select(&mut log).unwrap_err().is_schema());
        }
    }
    assert_eq!(recording.primary_key_queries, 2);
    assert_eq!(registry.cached_primary_key(&identity, "audit_log"), None);
}
