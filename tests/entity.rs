#[cfg(test)]
mod tests {
    use lynx::{Accessor, AsValue, Entity, Error, Registry, SqlType, Value};
    use rust_decimal::Decimal;
    use time::{PrimitiveDateTime, macros::datetime};
    use uuid::Uuid;

    #[derive(Entity, Default, Debug, PartialEq)]
    struct OrderLine {
        #[lynx(primary_key)]
        order_id: Option<i64>,
        #[lynx(primary_key, name = "LINE_NO")]
        line: Option<i16>,
        price: Option<Decimal>,
        r#type: Option<String>,
        shipped: Option<PrimitiveDateTime>,
        #[lynx(exclude)]
        cached_total: Option<f64>,
        reference: Box<Option<Uuid>>,
    }

    #[derive(Entity, Default)]
    #[lynx(name = "LEGACY_CUSTOMERS")]
    struct _Customer {
        id: Option<u32>,
        active: bool,
    }

    #[test]
    fn schema() {
        let schema = OrderLine::schema();
        assert_eq!(schema.name, "order_line");
        let names: Vec<_> = schema.properties.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            [
                "order_id",
                "line",
                "price",
                "type",
                "shipped",
                "cached_total",
                "reference"
            ]
        );
        let columns: Vec<_> = schema.properties.iter().map(|p| p.column_name()).collect();
        assert_eq!(columns[1], "LINE_NO");
        assert_eq!(columns[3], "type");
        assert!(schema.properties[0].primary_key);
        assert!(schema.properties[1].primary_key);
        assert!(!schema.properties[2].primary_key);
        assert!(schema.properties[5].exclude);
        assert!(!schema.properties[4].exclude);

        assert_eq!(_Customer::schema().name, "LEGACY_CUSTOMERS");
        assert_eq!(_Customer::schema().properties.len(), 2);
    }

    #[test]
    fn descriptor() {
        let registry = Registry::new();
        let descriptor = registry.resolve::<OrderLine>();
        assert_eq!(descriptor.relation, "order_line");
        assert_eq!(&*descriptor.explicit_primary_key, ["order_id", "LINE_NO"]);
        assert_eq!(descriptor.property_for_column("line_no"), Some("line"));
        assert_eq!(descriptor.property_for_column("TYPE"), Some("type"));
        assert_eq!(descriptor.property_for_column("unknown"), None);
        assert!(descriptor.is_excluded("cached_total"));
        assert!(descriptor.type_name.ends_with("OrderLine"));
        assert!(std::sync::Arc::ptr_eq(
            &descriptor,
            &registry.resolve::<OrderLine>()
        ));
    }

    #[test]
    fn accessor() {
        let mut line = OrderLine {
            order_id: Some(100),
            line: Some(2),
            price: Some(Decimal::new(999, 2)),
            r#type: Some("gift".into()),
            shipped: None,
            cached_total: Some(19.98),
            reference: Box::new(None),
        };
        let values = line.describe();
        assert_eq!(values.len(), 7);
        assert_eq!(values[0], ("order_id", Value::Int64(Some(100))));
        assert_eq!(values[3], ("type", Value::Varchar(Some("gift".into()))));
        assert_eq!(values[4], ("shipped", Value::Timestamp(None)));
        assert_eq!(values[6], ("reference", Value::Uuid(None)));

        assert_eq!(line.get_value("line"), Some(Value::Int16(Some(2))));
        assert_eq!(line.get_value("LINE_NO"), None);
        assert_eq!(line.get_type("price"), Some(SqlType::Decimal));
        assert_eq!(line.get_type("shipped"), Some(SqlType::Timestamp));
        assert_eq!(line.get_type("reference"), Some(SqlType::Uuid));
        assert_eq!(line.get_type("missing"), None);

        // Values are converted into the property type
        line.set_value("order_id", Value::Int32(Some(7))).unwrap();
        assert_eq!(line.order_id, Some(7));
        line.set_value("shipped", "2025-01-02 03:04:05".to_string().as_value())
            .unwrap();
        assert_eq!(line.shipped, Some(datetime!(2025-01-02 03:04:05)));
        line.set_value(
            "reference",
            Value::Varchar(Some("5e915574-bb30-4430-98cf-c5854f61fbbd".into())),
        )
        .unwrap();
        assert!(line.reference.is_some());
        line.set_value("price", Value::Null).unwrap();
        assert_eq!(line.price, None);

        let error = line
            .set_value("line", Value::Varchar(Some("second".into())))
            .unwrap_err();
        assert!(matches!(error, Error::Coercion { ref property, .. } if property == "line"));
        assert_eq!(line.line, Some(2));
        assert!(matches!(
            line.set_value("nothing", Value::Null),
            Err(Error::Coercion { .. })
        ));
    }

    #[test]
    fn non_optional_fields() {
        let mut customer = _Customer::default();
        assert_eq!(customer.get_value("active"), Some(Value::Boolean(Some(false))));
        customer.set_value("active", Value::Int64(Some(1))).unwrap();
        assert!(customer.active);
        assert!(customer.set_value("active", Value::Null).is_err());
        assert!(customer.active);
        customer.set_value("id", Value::Int64(Some(12))).unwrap();
        assert_eq!(customer.id, Some(12));
        assert!(
            customer
                .set_value("id", Value::Int64(Some(-1)))
                .is_err()
        );
    }
}
