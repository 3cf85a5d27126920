use crate::recreate;
use lynx::{AsValue, Connection, Entity, Session, Value};

#[derive(Entity, Default, Debug, PartialEq)]
#[lynx(name = "book")]
struct Book {
    #[lynx(name = "BOOK_ID")]
    id: Option<i32>,
    title: Option<String>,
    year: Option<i32>,
}

pub fn listing(connection: &mut dyn Connection) {
    recreate(
        connection,
        "book",
        "BOOK_ID INTEGER PRIMARY KEY, title VARCHAR(80), year INTEGER",
    );
    let mut session = Session::managed(connection);
    for (id, title, year) in [
        (1, "Dune", 1965_i32),
        (2, "Neuromancer", 1984),
        (3, "Hyperion", 1989),
        (4, "Foundation", 1951),
    ] {
        assert_eq!(
            session
                .execute(
                    "INSERT INTO book (BOOK_ID, title, year) VALUES (?1, ?2, ?3)",
                    &[
                        Value::Int32(Some(id)),
                        Value::Varchar(Some(title.into())),
                        year.as_value(),
                    ],
                )
                .expect("Failed to insert a book"),
            1
        );
    }

    let books = session
        .list_of::<Book>(
            "SELECT * FROM book WHERE year > ?1 ORDER BY year DESC",
            &[Value::Int32(Some(1960))],
        )
        .expect("Failed to list the books");
    assert_eq!(
        books.iter().filter_map(|v| v.title.as_deref()).collect::<Vec<_>>(),
        ["Hyperion", "Neuromancer", "Dune"]
    );
    assert_eq!(books[0].id, Some(3));

    // Columns without a property are skipped, missing ones stay default
    let books = session
        .list_of::<Book>(
            "SELECT title, year * 2 AS doubled, 'x' AS unmapped FROM book ORDER BY title",
            &[],
        )
        .expect("Failed to list the books");
    assert_eq!(books.len(), 4);
    assert_eq!(
        books[0],
        Book {
            id: None,
            title: Some("Dune".into()),
            year: None,
        }
    );

    let none = session
        .list_of::<Book>("SELECT * FROM book WHERE year > 2100", &[])
        .expect("Failed to list the books");
    assert!(none.is_empty());

    assert_eq!(
        session
            .execute("DELETE FROM book WHERE year < ?1", &[1970_i32.as_value()])
            .expect("Failed to delete"),
        2
    );
}
