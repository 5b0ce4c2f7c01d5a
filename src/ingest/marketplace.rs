//! Marketplace export adapter. Comma-separated, named columns, one row per
//! line item: the first row of an order carries the shipping block, the rest
//! repeat the order name with the shipping columns empty.

use std::collections::HashSet;

use csv::StringRecord;

use crate::domain::model::{drop_reason, Address, Order};
use crate::ingest::{
    clean, find_column, split_name, split_street_line, RowOutcome, EMAIL_PLACEHOLDER,
};
use crate::utils::error::{LabelError, Result};
use crate::utils::normalize::normalize;

/// National id is not present in marketplace exports; the carrier field
/// still has to be filled.
const NATIONAL_ID_PLACEHOLDER: &str = "00000000";

struct Columns {
    name: usize,
    email: usize,
    financial_status: usize,
    shipping_name: usize,
    address1: usize,
    address2: usize,
    city: usize,
    zip: usize,
    province: usize,
    phone: usize,
    method: usize,
}

impl Columns {
    fn detect(headers: &StringRecord) -> Result<Self> {
        let required = |names: &[&str]| {
            find_column(headers, names).ok_or_else(|| {
                LabelError::processing(format!("marketplace export missing column {:?}", names[0]))
            })
        };
        Ok(Self {
            name: required(&["Name"])?,
            email: required(&["Email"])?,
            financial_status: required(&["Financial Status"])?,
            shipping_name: required(&["Shipping Name"])?,
            address1: required(&["Shipping Address1", "Shipping Street"])?,
            address2: find_column(headers, &["Shipping Address2"]).unwrap_or(usize::MAX),
            city: required(&["Shipping City"])?,
            zip: required(&["Shipping Zip"])?,
            province: required(&["Shipping Province Name", "Shipping Province"])?,
            phone: find_column(headers, &["Shipping Phone", "Phone"]).unwrap_or(usize::MAX),
            method: required(&["Shipping Method"])?,
        })
    }
}

pub fn parse(text: &str) -> Result<Vec<RowOutcome>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = Columns::detect(reader.headers()?)?;
    let mut outcomes = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for record in reader.records() {
        let record = record?;
        let field = |i: usize| clean(record.get(i).unwrap_or(""));

        let id = field(columns.name);
        if id.is_empty() {
            outcomes.push(RowOutcome::Drop {
                order_id: String::new(),
                reason: drop_reason::MISSING_ORDER_ID.into(),
            });
            continue;
        }
        if !seen.insert(id.clone()) {
            outcomes.push(RowOutcome::Skip(format!("line item row for order {id}")));
            continue;
        }

        let status = normalize(&field(columns.financial_status));
        if status != "paid" {
            outcomes.push(RowOutcome::Drop {
                order_id: id,
                reason: drop_reason::NOT_PAID.into(),
            });
            continue;
        }

        let recipient = field(columns.shipping_name);
        if recipient.is_empty() {
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

        let email = field(columns.email);
        let autofilled_email = email.is_empty();
        let email = if autofilled_email {
            EMAIL_PLACEHOLDER.to_string()
        } else {
            email
        };

        let (street, number) = split_street_line(&field(columns.address1));
        let city = field(columns.city);
        let (first_name, last_name) = split_name(&recipient);

        let order = Order {
            id,
            first_name,
            last_name,
            national_id: NATIONAL_ID_PLACEHOLDER.to_string(),
            email,
            phone: field(columns.phone),
            shipping_hint: field(columns.method),
            address: Address {
                street,
                number,
                floor_unit: field(columns.address2),
                locality: city.clone(),
                city,
                province,
                // CPA letters are kept; comparisons use the digit core.
                postal_code: field(columns.zip),
            },
        };
        outcomes.push(RowOutcome::Order {
            order,
            autofilled_email,
        });
    }

    Ok(outcomes)
}
