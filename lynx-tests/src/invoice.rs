use crate::recreate;
use lynx::{Connection, Entity, Session};
use rust_decimal::Decimal;
use time::{PrimitiveDateTime, Time, macros::datetime};
use uuid::Uuid;

#[derive(Entity, Default, Debug, PartialEq)]
struct Invoice {
    #[lynx(primary_key)]
    code: Option<Uuid>,
    amount: Option<Decimal>,
    rate: Option<f64>,
    quantity: Option<u16>,
    issued: Option<PrimitiveDateTime>,
    due: Option<Time>,
    #[lynx(name = "CURRENCY")]
    currency: Option<char>,
}

/// Values of every kind survive a round trip.
pub fn invoice(connection: &mut dyn Connection) {
    recreate(
        connection,
        "invoice",
        "code UUID, amount DECIMAL(10,2), rate DOUBLE, quantity SMALLINT, \
         issued TIMESTAMP, due TIME, CURRENCY CHAR(1)",
    );
    let mut session = Session::managed(connection);
    let code = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap();
    let mut invoice = Invoice {
        code: Some(code),
        amount: Some(Decimal::new(1250, 2)),
        rate: Some(0.25),
        quantity: Some(7),
        issued: Some(datetime!(2024-03-01 10:30:15)),
        due: Some(Time::from_hms(17, 45, 0).unwrap()),
        currency: Some('€'),
    };
    assert_eq!(session.insert(&mut invoice).expect("Failed to insert"), 1);
    assert_eq!(invoice.code, Some(code));

    let mut found = Invoice {
        code: Some(code),
        ..Default::default()
    };
    assert!(session.select(&mut found).expect("Failed to select"));
    assert_eq!(found, invoice);

    found.amount = Some(Decimal::new(-3, 1));
    found.issued = Some(datetime!(1999-12-31 23:59:59.5));
    assert_eq!(session.save(&mut found).expect("Failed to save").rows_affected(), 1);
    let mut again = Invoice {
        code: Some(code),
        ..Default::default()
    };
    assert!(session.select(&mut again).expect("Failed to select"));
    assert_eq!(again.amount, Some(Decimal::new(-3, 1)));
    assert_eq!(again.issued, Some(datetime!(1999-12-31 23:59:59.5)));
}
