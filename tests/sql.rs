#[cfg(test)]
mod tests {
    use lynx::{
        Entity, EntityDescriptor, GeneratedKeyStrategy, Registry, SqlWriter, Vendor,
    };
    use std::sync::{Arc, LazyLock};
    use time::{Date, PrimitiveDateTime, macros::date, macros::datetime};

    #[derive(Entity, Default)]
    #[lynx(name = "EMPLOYEE")]
    struct Employee {
        #[lynx(name = "EMP_ID")]
        id: Option<i32>,
        name: Option<String>,
        hired: Option<Date>,
        last_login: Option<PrimitiveDateTime>,
        remote: Option<bool>,
        badge: Option<Vec<u8>>,
        salary: Option<f64>,
    }

    static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

    fn descriptor() -> Arc<EntityDescriptor> {
        REGISTRY.resolve::<Employee>()
    }

    fn employee() -> Employee {
        Employee {
            id: Some(5),
            name: Some("Zoë".into()),
            hired: Some(date!(2021 - 09 - 01)),
            last_login: Some(datetime!(2024-02-29 08:15:30.25)),
            remote: Some(true),
            badge: Some(vec![0xCA, 0xFE]),
            salary: None,
        }
    }

    fn insert(vendor: Vendor, keep_nulls: bool) -> String {
        let mut out = String::new();
        vendor
            .sql_writer()
            .write_insert(&mut out, &descriptor(), &employee(), keep_nulls);
        out
    }

    fn update(vendor: Vendor) -> String {
        let mut out = String::new();
        vendor
            .sql_writer()
            .write_update(
                &mut out,
                &descriptor(),
                &employee(),
                &["EMP_ID".into()],
                false,
            )
            .expect("Failed to write the update");
        out
    }

    #[test]
    fn generic() {
        assert_eq!(
            insert(Vendor::Generic, false),
            "INSERT INTO EMPLOYEE (EMP_ID,name,hired,last_login,remote,badge) VALUES \
             (5,'Zoë','2021-09-01','2024-02-29 08:15:30.25',TRUE,X'cafe')"
        );
        assert_eq!(
            insert(Vendor::Sqlite, true),
            "INSERT INTO EMPLOYEE (EMP_ID,name,hired,last_login,remote,badge,salary) VALUES \
             (5,'Zoë','2021-09-01','2024-02-29 08:15:30.25',TRUE,X'cafe',NULL)"
        );
        assert_eq!(
            update(Vendor::Mysql),
            "UPDATE EMPLOYEE SET name = 'Zoë', hired = '2021-09-01', \
             last_login = '2024-02-29 08:15:30.25', remote = TRUE, badge = X'cafe' \
             WHERE EMP_ID = 5"
        );
    }

    #[test]
    fn oracle() {
        assert_eq!(
            insert(Vendor::Oracle, false),
            "INSERT INTO EMPLOYEE (EMP_ID,name,hired,last_login,remote,badge) VALUES \
             (5,'Zoë',to_date('2021-09-01','yyyy-mm-dd'),\
             to_date('2024-02-29 08:15:30','yyyy-mm-dd hh24:mi:ss'),TRUE,hextoraw('cafe'))"
        );
    }

    #[test]
    fn mssql() {
        assert_eq!(
            insert(Vendor::Mssql, false),
            "INSERT INTO EMPLOYEE (EMP_ID,name,hired,last_login,remote,badge) VALUES \
             (5,N'Zoë','2021-09-01','2024-02-29 08:15:30.25','1',0xcafe)"
        );
        assert!(update(Vendor::Mssql).contains("remote = '1'"));
    }

    #[test]
    fn postgres() {
        assert_eq!(
            insert(Vendor::Postgres, false),
            "INSERT INTO EMPLOYEE (EMP_ID,name,hired,last_login,remote,badge) VALUES \
             (5,'Zoë','2021-09-01','2024-02-29 08:15:30.25',TRUE,'\\xcafe')"
        );
        let mut entity = employee();
        entity.salary = Some(f64::NAN);
        let mut out = String::new();
        Vendor::Postgres
            .sql_writer()
            .write_insert(&mut out, &descriptor(), &entity, false);
        assert!(out.ends_with(",'NaN'::FLOAT8)"), "{}", out);
    }

    #[test]
    fn statements_by_key() {
        let writer = Vendor::Generic.sql_writer();
        let pk = ["EMP_ID".to_string()];
        let mut out = String::new();
        writer
            .write_select(&mut out, &descriptor(), &employee(), &pk)
            .unwrap();
        assert_eq!(out, "SELECT * FROM EMPLOYEE WHERE EMP_ID = 5");
        let mut out = String::new();
        writer
            .write_exists(&mut out, &descriptor(), &employee(), &pk)
            .unwrap();
        assert_eq!(out, "SELECT EMP_ID FROM EMPLOYEE WHERE EMP_ID = 5");
        let mut out = String::new();
        writer
            .write_delete(&mut out, &descriptor(), &employee(), &pk)
            .unwrap();
        assert_eq!(out, "DELETE FROM EMPLOYEE WHERE EMP_ID = 5");

        let mut out = String::new();
        let nobody = Employee::default();
        assert!(
            writer
                .write_delete(&mut out, &descriptor(), &nobody, &pk)
                .unwrap_err()
                .is_validation()
        );
        assert!(out.is_empty());
    }

    #[test]
    fn vendors() {
        assert_eq!(Vendor::detect("Microsoft SQL Server"), Vendor::Mssql);
        assert_eq!(Vendor::detect("Oracle"), Vendor::Oracle);
        assert_eq!(Vendor::detect("MariaDB"), Vendor::Mysql);
        assert_eq!(Vendor::detect("PostgreSQL"), Vendor::Postgres);
        assert_eq!(Vendor::detect("SQLite"), Vendor::Sqlite);
        assert_eq!(Vendor::detect("H2"), Vendor::Generic);
        assert_eq!(
            Vendor::Postgres.generated_key_strategy(true),
            GeneratedKeyStrategy::NamedColumnReturn
        );
        assert_eq!(
            Vendor::Mysql.generated_key_strategy(true),
            GeneratedKeyStrategy::ReturnGeneratedKeys
        );
        assert_eq!(
            Vendor::Oracle.generated_key_strategy(false),
            GeneratedKeyStrategy::None
        );
    }
}
