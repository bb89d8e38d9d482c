//! In-memory event table that remembers its source rows.

use csv::StringRecord;
use tracing::warn;

use crate::error::StoreError;
use crate::event::{Event, LAST_CHECKED_FORMAT, Status, parse_event_date, parse_last_checked};

/// Column names the table needs, in the order they are reported when missing.
pub const REQUIRED_COLUMNS: [&str; 6] = ["name", "date", "email", "status", "lastChecked", "error"];

/// Positions of the required columns in the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    name: usize,
    date: usize,
    email: usize,
    status: usize,
    last_checked: usize,
    error: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, StoreError> {
        let find = |wanted: &str| headers.iter().position(|h| h.trim() == wanted);

        let positions: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().copied().map(find).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| (*name).to_string())
            .collect();

        match positions.as_slice() {
            [
                Some(name),
                Some(date),
                Some(email),
                Some(status),
                Some(last_checked),
                Some(error),
            ] => Ok(Self {
                name: *name,
                date: *date,
                email: *email,
                status: *status,
                last_checked: *last_checked,
                error: *error,
            }),
            _ => Err(StoreError::MissingColumns(missing)),
        }
    }
}

/// A loaded event row: the parsed event plus the raw cells it came from.
#[derive(Debug, Clone)]
struct Row {
    record: StringRecord,
    event: Event,
}

/// Ordered event rows with their original header and cells.
///
/// Saving rewrites only the `status`, `lastChecked` and `error` cells;
/// every other column, the header order and the row order are preserved.
#[derive(Debug, Clone)]
pub struct EventTable {
    headers: StringRecord,
    columns: Columns,
    rows: Vec<Row>,
}

impl EventTable {
    /// Builds a table from a header row and data records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingColumns`] if a required column is absent.
    pub fn from_records(
        headers: StringRecord,
        records: impl IntoIterator<Item = StringRecord>,
    ) -> Result<Self, StoreError> {
        let columns = Columns::locate(&headers)?;
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| Row {
                event: parse_row(&columns, &record, index),
                record,
            })
            .collect();

        Ok(Self {
            headers,
            columns,
            rows,
        })
    }

    /// Returns the header row.
    #[must_use]
    pub const fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Returns the number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the events in row order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.rows.iter().map(|row| &row.event)
    }

    /// Iterates mutably over the events in row order.
    pub fn events_mut(&mut self) -> impl Iterator<Item = &mut Event> {
        self.rows.iter_mut().map(|row| &mut row.event)
    }

    /// Returns the event at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.rows.get(index).map(|row| &row.event)
    }

    /// Returns the event at `index` mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Event> {
        self.rows.get_mut(index).map(|row| &mut row.event)
    }

    /// Produces the records to write back, owned cells replaced.
    ///
    /// A `lastChecked` the engine never set keeps its original cell.
    pub fn to_records(&self) -> impl Iterator<Item = StringRecord> + '_ {
        self.rows.iter().map(|row| {
            let event = &row.event;
            let last_checked = event
                .last_checked
                .map(|at| at.format(LAST_CHECKED_FORMAT).to_string());

            row.record
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    if i == self.columns.status {
                        event.status.as_str().to_string()
                    } else if i == self.columns.error {
                        event.status.error_text().to_string()
                    } else if i == self.columns.last_checked {
                        last_checked.clone().unwrap_or_else(|| cell.to_string())
                    } else {
                        cell.to_string()
                    }
                })
                .collect()
        })
    }
}

fn parse_row(columns: &Columns, record: &StringRecord, index: usize) -> Event {
    let cell = |i: usize| record.get(i).unwrap_or_default();

    let status = Status::from_cells(cell(columns.status), cell(columns.error));
    if matches!(status, Status::Unrecognized { .. }) {
        warn!(
            "Row {}: unknown status {:?}, leaving the row untouched",
            index + 1,
            cell(columns.status)
        );
    }

    Event {
        name: cell(columns.name).trim().to_string(),
        date: parse_event_date(cell(columns.date)),
        recipient: cell(columns.email).trim().to_string(),
        status,
        last_checked: parse_last_checked(cell(columns.last_checked)),
        days_until: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn test_missing_columns_reported() {
        let err = EventTable::from_records(record(&["name", "date", "email"]), []).unwrap_err();
        match err {
            StoreError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["status", "lastChecked", "error"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_columns_in_any_order() {
        let headers = record(&["error", "email", "notes", "lastChecked", "status", "date", "name"]);
        let table = EventTable::from_records(
            headers,
            [record(&["", "a@b.co", "vip", "", "", "2025-04-01", "Gala"])],
        )
        .unwrap();

        let event = table.get(0).unwrap();
        assert_eq!(event.name, "Gala");
        assert_eq!(event.recipient, "a@b.co");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 4, 1));
        assert_eq!(event.status, Status::Pending);
    }

    #[test]
    fn test_owned_cells_rewritten() {
        let headers = record(&["name", "date", "email", "status", "lastChecked", "error", "notes"]);
        let mut table = EventTable::from_records(
            headers,
            [
                record(&["A", "2025-04-01", "a@b.co", "error", "2025-03-01 08:00:00", "old", "x"]),
                record(&["B", "2025-04-02", "b@b.co", "", "garbage", "", "y"]),
            ],
        )
        .unwrap();

        let now = NaiveDate::from_ymd_opt(2025, 3, 2)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();
        table.get_mut(0).unwrap().mark_successful(now);

        let records: Vec<StringRecord> = table.to_records().collect();
        assert_eq!(
            records[0],
            record(&["A", "2025-04-01", "a@b.co", "successful", "2025-03-02 10:15:00", "", "x"])
        );
        assert_eq!(
            records[1],
            record(&["B", "2025-04-02", "b@b.co", "pending", "garbage", "", "y"])
        );
    }
}
