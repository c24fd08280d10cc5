use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use std::io::Read;
use tracing::{debug, info};

use super::ServiceError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZipcodeRecord {
    pub zipcode: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Coordinates for a postal code from the `zipcodes` reference table
pub async fn coordinates(conn: &mut PgConnection, zipcode: &str) -> Result<Option<(f64, f64)>, ServiceError> {
    let zipcode = zipcode.trim();
    if zipcode.is_empty() {
        return Ok(None);
    }

    let row: Option<(f64, f64)> = sqlx::query_as("SELECT latitude, longitude FROM zipcodes WHERE zipcode = $1")
        .bind(zipcode)
        .fetch_optional(conn)
        .await?;

    if row.is_none() {
        debug!("No coordinates known for zipcode {}", zipcode);
    }
    Ok(row)
}

/// Parse `zipcode,latitude,longitude` CSV (with header row); bad rows are skipped and counted
pub fn parse_csv<R: Read>(reader: R) -> (Vec<ZipcodeRecord>, usize) {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    let mut skipped = 0;

    for result in csv_reader.deserialize::<ZipcodeRecord>() {
        match result {
            Ok(record) if valid_coordinates(record.latitude, record.longitude) && !record.zipcode.is_empty() => {
                records.push(record)
            }
            Ok(_) | Err(_) => skipped += 1,
        }
    }

    (records, skipped)
}

fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// Upsert reference rows in a single transaction
pub async fn import(pool: &PgPool, records: &[ZipcodeRecord]) -> Result<u64, ServiceError> {
    let mut tx = pool.begin().await?;
    let mut imported = 0;

    for chunk in records.chunks(1000) {
        let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new("INSERT INTO zipcodes (zipcode, latitude, longitude) ");
        builder.push_values(chunk, |mut row, record| {
            row.push_bind(&record.zipcode)
                .push_bind(record.latitude)
                .push_bind(record.longitude);
        });
        builder.push(
            " ON CONFLICT (zipcode) DO UPDATE SET latitude = EXCLUDED.latitude, longitude = EXCLUDED.longitude",
        );
        imported += builder.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    info!("Imported {} zipcodes", imported);
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_counts_bad_ones() {
        let data = "zipcode,latitude,longitude\n\
                    10001, 40.7506, -73.9972\n\
                    90210,34.0901,-118.4065\n\
                    99999,not-a-number,0\n\
                    00000,95.0,10.0\n";
        let (records, skipped) = parse_csv(data.as_bytes());
        assert_eq!(skipped, 2);
        assert_eq!(
            records[0],
            ZipcodeRecord { zipcode: "10001".to_string(), latitude: 40.7506, longitude: -73.9972 }
        );
        assert_eq!(records[1].zipcode, "90210");
    }
}
