use lynx::{
    Config, DataSourceRegistry, Driver, Entity, Properties, Session, UrlDataSource, Value,
};
use std::sync::Arc;

#[derive(Entity, Default, Debug)]
#[lynx(name = "visit")]
struct Visit {
    id: Option<i64>,
    page: Option<String>,
}

/// Sessions opening their own connections release them after every operation.
pub fn owned_session(driver: Arc<dyn Driver>, url: &str) {
    let mut session = Session::open(driver.clone(), url, Properties::new());
    assert!(!session.is_connected());
    session
        .execute("DROP TABLE IF EXISTS visit", &[])
        .expect("Failed to drop visit");
    assert!(!session.is_connected());
    session
        .execute(
            "CREATE TABLE visit (id INTEGER PRIMARY KEY, page VARCHAR(200))",
            &[],
        )
        .expect("Failed to create visit");
    let mut visit = Visit {
        id: None,
        page: Some("/index.html".into()),
    };
    session.insert(&mut visit).expect("Failed to insert");
    assert!(!session.is_connected());
    assert!(visit.id.is_some());
    assert_eq!(session.vendor(), Some(lynx::Vendor::Sqlite));

    // A connection asked for explicitly stays until closed
    session.connect().expect("Failed to connect");
    assert!(session.is_connected());
    session.close().expect("Failed to close");
    assert!(!session.is_connected());

    // Named lookup
    let mut directory = DataSourceRegistry::new();
    directory.register(
        "env/visits",
        Arc::new(UrlDataSource::new(driver.clone(), url, Properties::new())),
    );
    let mut session = Session::named("visits", Arc::new(directory));
    let mut found = Visit {
        id: visit.id,
        page: None,
    };
    assert!(session.select(&mut found).expect("Failed to select"));
    assert_eq!(found.page.as_deref(), Some("/index.html"));
    assert!(!session.is_connected());

    let mut session = Session::named("missing", Arc::new(DataSourceRegistry::new()));
    assert!(matches!(
        session.select(&mut found),
        Err(lynx::Error::Connection(..))
    ));

    // Configured connection and queries
    let config: Config = format!(
        "[connections.visits]\n\
         url = \"{url}\"\n\
         [queries]\n\
         visits-of-page = \"SELECT * FROM visit WHERE page = ?1 ORDER BY id\"\n\
         forget-page = \"DELETE FROM visit WHERE page = ?1\"\n"
    )
    .parse()
    .expect("Failed to parse the configuration");
    let directory = DataSourceRegistry::from_config(&config, &[driver])
        .expect("Failed to build the data sources");
    let mut session = Session::from_config(&config, "visits", Arc::new(directory))
        .expect("Failed to create the session");
    let mut second = Visit {
        id: None,
        page: Some("/index.html".into()),
    };
    session.insert(&mut second).expect("Failed to insert");
    let page = Value::Varchar(Some("/index.html".into()));
    let visits = session
        .list_of::<Visit>("visits-of-page", &[page.clone()])
        .expect("Failed to run the named query");
    assert_eq!(
        visits.iter().map(|v| v.id).collect::<Vec<_>>(),
        [visit.id, second.id]
    );
    assert_eq!(
        session
            .execute("forget-page", &[page])
            .expect("Failed to run the named statement"),
        2
    );
    assert!(!session.is_connected());
}
