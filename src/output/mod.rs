//! Carrier-format serialization. The pipeline hands over destination sets;
//! this module owns field order, header texts and the character set the
//! carrier accepts.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::domain::model::{
    Branch, Destination, Order, OutputLayout, OutputRecord, PackageSpec,
};
use crate::domain::ports::OutputSink;
use crate::utils::error::Result;
use crate::utils::normalize::normalize_strict;
use crate::utils::phone::split_phone;

/// The carrier product code for standard parcels.
const PRODUCT_CODE: &str = "CP";

const HEADERS: &[&str] = &[
    "tipo_producto",
    "largo",
    "ancho",
    "altura",
    "peso",
    "valor_del_contenido",
    "provincia_destino",
    "sucursal_destino",
    "localidad_destino",
    "calle_destino",
    "altura_destino",
    "piso",
    "dpto",
    "codpostal_destino",
    "destino_nombre",
    "destino_email",
    "cod_area_tel",
    "tel",
    "cod_area_cel",
    "cel",
    "numero_orden",
];

/// Builds carrier rows from resolved orders. One serializer per run; the
/// package attributes are constant across all rows.
#[derive(Debug, Clone)]
pub struct CarrierSerializer {
    package: PackageSpec,
}

impl CarrierSerializer {
    pub fn new(package: PackageSpec) -> Self {
        Self { package }
    }

    pub fn layout(name: impl Into<String>) -> OutputLayout {
        OutputLayout {
            name: name.into(),
            headers: HEADERS.iter().map(|h| h.to_string()).collect(),
            delimiter: b';',
        }
    }

    pub fn record(&self, order: &Order, destination: &Destination) -> OutputRecord {
        match destination {
            Destination::HomeDelivery {
                province_code, ..
            } => self.build(order, *province_code, None),
            Destination::PickupBranch {
                branch,
                province_code,
            } => self.build(order, *province_code, Some(branch)),
        }
    }

    /// Branch code and domicile fields are mutually exclusive: the carrier
    /// rejects rows that fill both.
    fn build(&self, order: &Order, province_code: char, branch: Option<&Branch>) -> OutputRecord {
        let phone = split_phone(&order.phone, &order.address.province);
        let full_name = format!("{} {}", order.first_name, order.last_name);

        let mut record = OutputRecord::default();
        record.push("tipo_producto", PRODUCT_CODE);
        record.push("largo", format_dim(self.package.length_cm));
        record.push("ancho", format_dim(self.package.width_cm));
        record.push("altura", format_dim(self.package.height_cm));
        record.push("peso", format!("{:.3}", self.package.weight_kg));
        record.push("valor_del_contenido", format!("{:.2}", self.package.declared_value));
        record.push("provincia_destino", province_code.to_string());

        match branch {
            Some(branch) => {
                record.push("sucursal_destino", normalize_strict(&branch.name));
                for field in [
                    "localidad_destino",
                    "calle_destino",
                    "altura_destino",
                    "piso",
                    "dpto",
                    "codpostal_destino",
                ] {
                    record.push(field, "");
                }
            }
            None => {
                record.push("sucursal_destino", "");
                record.push("localidad_destino", normalize_strict(&order.address.locality));
                record.push("calle_destino", normalize_strict(&order.address.street));
                record.push("altura_destino", normalize_strict(&order.address.number));
                record.push("piso", normalize_strict(&order.address.floor_unit));
                record.push("dpto", "");
                record.push("codpostal_destino", order.address.postal_code.trim());
            }
        }

        record.push("destino_nombre", normalize_strict(&full_name));
        record.push("destino_email", order.email.trim().to_lowercase());
        record.push("cod_area_tel", phone.area_code.clone());
        record.push("tel", phone.number.clone());
        record.push("cod_area_cel", phone.area_code);
        record.push("cel", phone.number);
        record.push("numero_orden", order.id.as_str());
        record
    }
}

fn format_dim(value: f64) -> String {
    format!("{:.0}", value)
}

/// Writes one delimited file per record set under a target directory.
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl OutputSink for CsvSink {
    fn write(&self, layout: &OutputLayout, records: &[OutputRecord]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.csv", layout.name));
        let mut writer = csv::WriterBuilder::new()
            .delimiter(layout.delimiter)
            .from_path(&path)?;

        writer.write_record(&layout.headers)?;
        for record in records {
            writer.write_record(record.values())?;
        }
        writer.flush()?;

        info!(file = %path.display(), rows = records.len(), "wrote carrier file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Address;

    fn order() -> Order {
        Order {
            id: "5001".into(),
            first_name: "Ana".into(),
            last_name: "María Paz".into(),
            national_id: "30111222".into(),
            email: "  Ana@Example.COM ".into(),
            phone: "+54 9 291 555 1234".into(),
            shipping_hint: "Punto de retiro".into(),
            address: Address {
                street: "Güemes".into(),
                number: "45".into(),
                floor_unit: "3º B".into(),
                locality: "Bahía Blanca".into(),
                city: "Bahía Blanca".into(),
                province: "Buenos Aires".into(),
                postal_code: "8000".into(),
            },
        }
    }

    #[test]
    fn test_pickup_record_excludes_domicile_fields() {
        let serializer = CarrierSerializer::new(PackageSpec::default());
        let destination = Destination::PickupBranch {
            branch: Branch::new("BAHÍA BLANCA", "Balcarce 333", "Buenos Aires", "Bahía Blanca"),
            province_code: 'B',
        };
        let record = serializer.record(&order(), &destination);

        assert_eq!(record.get("tipo_producto"), Some("CP"));
        assert_eq!(record.get("provincia_destino"), Some("B"));
        assert_eq!(record.get("sucursal_destino"), Some("BAHIA BLANCA"));
        assert_eq!(record.get("calle_destino"), Some(""));
        assert_eq!(record.get("codpostal_destino"), Some(""));
        assert_eq!(record.get("destino_email"), Some("ana@example.com"));
        assert_eq!(record.get("cod_area_tel"), Some("291"));
        assert_eq!(record.get("tel"), Some("5551234"));
        assert_eq!(record.get("numero_orden"), Some("5001"));
    }

    #[test]
    fn test_home_record_fills_domicile_fields() {
        let serializer = CarrierSerializer::new(PackageSpec::default());
        let destination = Destination::HomeDelivery {
            region: "BUENOS AIRES BAHIA BLANCA".into(),
            province_code: 'B',
        };
        let record = serializer.record(&order(), &destination);

        assert_eq!(record.get("sucursal_destino"), Some(""));
        assert_eq!(record.get("calle_destino"), Some("Guemes"));
        assert_eq!(record.get("altura_destino"), Some("45"));
        assert_eq!(record.get("piso"), Some("3 B"));
        assert_eq!(record.get("codpostal_destino"), Some("8000"));
        assert_eq!(record.get("peso"), Some("1.000"));
        assert_eq!(record.get("valor_del_contenido"), Some("100.00"));
    }

    #[test]
    fn test_record_matches_layout_width() {
        let serializer = CarrierSerializer::new(PackageSpec::default());
        let layout = CarrierSerializer::layout("pickup");
        let destination = Destination::HomeDelivery {
            region: "X".into(),
            province_code: 'B',
        };
        let record = serializer.record(&order(), &destination);
        assert_eq!(record.fields.len(), layout.headers.len());
        for ((field, _), header) in record.fields.iter().zip(&layout.headers) {
            assert_eq!(field, header);
        }
    }

    #[test]
    fn test_csv_sink_writes_delimited_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path());
        let serializer = CarrierSerializer::new(PackageSpec::default());
        let layout = CarrierSerializer::layout("home");
        let destination = Destination::HomeDelivery {
            region: "BUENOS AIRES BAHIA BLANCA".into(),
            province_code: 'B',
        };
        let record = serializer.record(&order(), &destination);

        sink.write(&layout, &[record]).unwrap();

        let written = fs::read_to_string(dir.path().join("home.csv")).unwrap();
        let mut lines = written.lines();
        assert!(lines.next().unwrap().starts_with("tipo_producto;largo;"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("CP;10;10;10;1.000;100.00;B;"));
        assert!(row.ends_with(";5001"));
    }
}
