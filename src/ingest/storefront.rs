//! Storefront export adapter. Semicolon-separated, fixed column positions,
//! one row per order plus continuation rows that repeat the order id with
//! the buyer fields left empty.

use csv::StringRecord;

use crate::domain::model::{drop_reason, Address, Order};
use crate::ingest::{
    clean, find_column, repair_street_number, split_name, RowOutcome, EMAIL_PLACEHOLDER,
};
use crate::utils::error::Result;

// Default column positions in the storefront export; header-name lookup
// overrides them when the export carries recognizable headers.
const COL_ID: usize = 0;
const COL_EMAIL: usize = 1;
const COL_NAME: usize = 11;
const COL_NATIONAL_ID: usize = 12;
const COL_PHONE: usize = 13;
const COL_STREET: usize = 16;
const COL_NUMBER: usize = 17;
const COL_FLOOR: usize = 18;
const COL_LOCALITY: usize = 19;
const COL_CITY: usize = 20;
const COL_POSTAL: usize = 21;
const COL_PROVINCE: usize = 22;
const COL_SHIPPING: usize = 24;

struct Columns {
    id: usize,
    email: usize,
    name: usize,
    national_id: usize,
    phone: usize,
    street: usize,
    number: usize,
    floor: usize,
    locality: usize,
    city: usize,
    postal: usize,
    province: usize,
    shipping: usize,
}

impl Columns {
    fn detect(headers: &StringRecord) -> Self {
        let col = |names: &[&str], fallback| find_column(headers, names).unwrap_or(fallback);
        Self {
            id: col(&["Número de orden"], COL_ID),
            email: col(&["Email"], COL_EMAIL),
            name: col(&["Nombre del comprador"], COL_NAME),
            national_id: col(&["DNI / CUIT", "DNI"], COL_NATIONAL_ID),
            phone: col(&["Teléfono"], COL_PHONE),
            street: col(&["Dirección"], COL_STREET),
            number: col(&["Número"], COL_NUMBER),
            floor: col(&["Piso"], COL_FLOOR),
            locality: col(&["Localidad"], COL_LOCALITY),
            city: col(&["Ciudad"], COL_CITY),
            postal: col(&["Código postal"], COL_POSTAL),
            province: col(&["Provincia o estado", "Provincia"], COL_PROVINCE),
            shipping: col(&["Medio de envío"], COL_SHIPPING),
        }
    }
}

pub fn parse(text: &str) -> Result<Vec<RowOutcome>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = Columns::detect(reader.headers()?);
    let mut outcomes = Vec::new();
    let mut previous_id = String::new();

    for record in reader.records() {
        let record = record?;
        let field = |i: usize| clean(record.get(i).unwrap_or(""));

        let id = field(columns.id);
        let email = field(columns.email);
        let name = field(columns.name);

        // Multi-item orders repeat as extra rows with the buyer columns
        // empty; the id is sometimes repeated and sometimes blank.
        if id.is_empty() {
            outcomes.push(RowOutcome::Skip("continuation row without id".into()));
            continue;
        }
        if id == previous_id && email.is_empty() && name.is_empty() {
            outcomes.push(RowOutcome::Skip(format!("continuation row for order {id}")));
            continue;
        }
        previous_id = id.clone();

        if name.is_empty() {
            outcomes.push(RowOutcome::Drop {
                order_id: id,
                reason: drop_reason::MISSING_RECIPIENT.into(),
            });
            continue;
        }
        let province = field(columns.province);
        if province.is_empty() {
            outcomes.push(RowOutcome::Drop {
                order_id: id,
                reason: drop_reason::MISSING_PROVINCE.into(),
            });
            continue;
        }

        let autofilled_email = email.is_empty();
        let email = if autofilled_email {
            EMAIL_PLACEHOLDER.to_string()
        } else {
            email
        };

        let (first_name, last_name) = split_name(&name);
        let order = Order {
            id,
            first_name,
            last_name,
            national_id: field(columns.national_id),
            email,
            phone: field(columns.phone),
            shipping_hint: field(columns.shipping),
            address: Address {
                street: field(columns.street),
                number: repair_street_number(&field(columns.number)),
                floor_unit: field(columns.floor),
                locality: field(columns.locality),
                city: field(columns.city),
                province,
                postal_code: field(columns.postal),
            },
        };
        outcomes.push(RowOutcome::Order {
            order,
            autofilled_email,
        });
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ShippingMode;

    fn row(fields: &[(usize, &str)]) -> String {
        let mut cols = vec![String::new(); 25];
        for (i, v) in fields {
            cols[*i] = v.to_string();
        }
        cols.join(";")
    }

    fn header() -> String {
        let mut cols = vec![String::new(); 25];
        cols[COL_ID] = "Número de orden".into();
        cols[COL_EMAIL] = "Email".into();
        cols[COL_SHIPPING] = "Medio de envío".into();
        cols.join(";")
    }

    #[test]
    fn test_parse_complete_order() {
        let text = format!(
            "{}\n{}",
            header(),
            row(&[
                (COL_ID, "5001"),
                (COL_EMAIL, "Ana@Example.COM"),
                (COL_NAME, "Ana María Paz"),
                (COL_NATIONAL_ID, "30111222"),
                (COL_PHONE, "+54 9 291 555-1234"),
                (COL_STREET, "Balcarce"),
                (COL_NUMBER, "333"),
                (COL_LOCALITY, "Bahía Blanca"),
                (COL_CITY, "Bahía Blanca"),
                (COL_POSTAL, "8000"),
                (COL_PROVINCE, "Buenos Aires"),
                (COL_SHIPPING, "Punto de retiro"),
            ])
        );
        let outcomes = parse(&text).unwrap();
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            RowOutcome::Order {
                order,
                autofilled_email,
            } => {
                assert_eq!(order.id, "5001");
                assert_eq!(order.first_name, "Ana");
                assert_eq!(order.last_name, "María Paz");
                assert_eq!(order.address.number, "333");
                assert_eq!(order.shipping_mode(), ShippingMode::PickupBranch);
                assert!(!autofilled_email);
            }
            other => panic!("expected order, got {other:?}"),
        }
    }

    #[test]
    fn test_continuation_rows_are_skipped_not_dropped() {
        let text = format!(
            "{}\n{}\n{}\n{}",
            header(),
            row(&[
                (COL_ID, "5001"),
                (COL_EMAIL, "a@b.com"),
                (COL_NAME, "Ana Paz"),
                (COL_PROVINCE, "Buenos Aires"),
            ]),
            // Same id, empty buyer fields: a second line item.
            row(&[(COL_ID, "5001")]),
            row(&[]),
        );
        let outcomes = parse(&text).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], RowOutcome::Order { .. }));
        assert!(matches!(outcomes[1], RowOutcome::Skip(_)));
        assert!(matches!(outcomes[2], RowOutcome::Skip(_)));
    }

    #[test]
    fn test_missing_name_is_dropped() {
        let text = format!(
            "{}\n{}",
            header(),
            row(&[(COL_ID, "5002"), (COL_EMAIL, "a@b.com"), (COL_PROVINCE, "Salta")])
        );
        let outcomes = parse(&text).unwrap();
        match &outcomes[0] {
            RowOutcome::Drop { order_id, reason } => {
                assert_eq!(order_id, "5002");
                assert_eq!(reason, drop_reason::MISSING_RECIPIENT);
            }
            other => panic!("expected drop, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_email_gets_placeholder() {
        let text = format!(
            "{}\n{}",
            header(),
            row(&[
                (COL_ID, "5003"),
                (COL_NAME, "Juan Gómez"),
                (COL_PROVINCE, "Mendoza"),
            ])
        );
        let outcomes = parse(&text).unwrap();
        match &outcomes[0] {
            RowOutcome::Order {
                order,
                autofilled_email,
            } => {
                assert!(autofilled_email);
                assert_eq!(order.email, EMAIL_PLACEHOLDER);
            }
            other => panic!("expected order, got {other:?}"),
        }
    }

    #[test]
    fn test_header_names_override_default_positions() {
        let text = "Número de orden;Email;Provincia o estado;Nombre del comprador;Medio de envío\n\
                    7001;e@x.com;Salta;Eva Díaz;Punto de retiro";
        let outcomes = parse(text).unwrap();
        match &outcomes[0] {
            RowOutcome::Order { order, .. } => {
                assert_eq!(order.id, "7001");
                assert_eq!(order.first_name, "Eva");
                assert_eq!(order.address.province, "Salta");
                assert_eq!(order.shipping_hint, "Punto de retiro");
            }
            other => panic!("expected order, got {other:?}"),
        }
    }

    #[test]
    fn test_sn_street_number_becomes_zero() {
        let text = format!(
            "{}\n{}",
            header(),
            row(&[
                (COL_ID, "5004"),
                (COL_EMAIL, "a@b.com"),
                (COL_NAME, "Juan Gómez"),
                (COL_STREET, "Ruta 3"),
                (COL_NUMBER, "S/N"),
                (COL_PROVINCE, "Chubut"),
            ])
        );
        let outcomes = parse(&text).unwrap();
        match &outcomes[0] {
            RowOutcome::Order { order, .. } => assert_eq!(order.address.number, "0"),
            other => panic!("expected order, got {other:?}"),
        }
    }
}
