mod attachment;
mod fruit;
mod invoice;
mod listing;
mod nullability;
mod owned;
mod person;
mod primary_key;
mod recording;
mod ticket;
mod trigger;
mod validation;

use crate::{
    attachment::attachment, fruit::fruit, invoice::invoice, listing::listing,
    nullability::nullability, owned::owned_session, person::person, primary_key::primary_key,
    ticket::ticket, trigger::trigger, validation::validation,
};
use log::LevelFilter;
use lynx::{Connection, Driver, Properties};
pub use recording::RecordingConnection;
use std::{env, sync::Arc};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run every behaviour check against the database at `url`.
///
/// The database must be persistent (not in memory), owned sessions reconnect
/// between operations and expect to find the same tables.
pub fn execute_tests(driver: Arc<dyn Driver>, url: &str) {
    let mut connection = driver
        .connect(url, &Properties::new())
        .expect("Could not open the connection");
    person(connection.as_mut());
    ticket(connection.as_mut());
    nullability(connection.as_mut());
    fruit(connection.as_mut());
    invoice(connection.as_mut());
    primary_key(connection.as_mut());
    validation(connection.as_mut());
    listing(connection.as_mut());
    attachment(connection.as_mut());
    trigger(connection.as_mut());
    connection.close().expect("Could not close the connection");
    assert!(connection.is_closed());
    owned_session(driver, url);
}

/// Drop and create a table, panics on failure.
pub(crate) fn recreate(connection: &mut dyn Connection, table: &str, definition: &str) {
    connection
        .execute_params(&format!("DROP TABLE IF EXISTS {}", table), &[])
        .unwrap_or_else(|e| panic!("Failed to drop {}: {:#}", table, e));
    connection
        .execute_params(&format!("CREATE TABLE {} ({})", table, definition), &[])
        .unwrap_or_else(|e| panic!("Failed to create {}: {:#}", table, e));
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
