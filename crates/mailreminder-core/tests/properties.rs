//! Property tests for the reminder policy and the CSV store.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, NaiveDate};
use csv::StringRecord;
use mailreminder_core::{CsvEventStore, EventStore, EventTable, ReminderPolicy, Status};
use proptest::prelude::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn single_event(date: NaiveDate, status: &str, error: &str) -> EventTable {
    EventTable::from_records(
        StringRecord::from(vec!["name", "date", "email", "status", "lastChecked", "error"]),
        [StringRecord::from(vec![
            "Event".to_string(),
            date.format("%Y-%m-%d").to_string(),
            "a@example.com".to_string(),
            status.to_string(),
            String::new(),
            error.to_string(),
        ])],
    )
    .unwrap()
}

proptest! {
    #[test]
    fn due_exactly_on_offsets(days in -400i64..400) {
        let mut table = single_event(today() + Duration::days(days), "pending", "");
        let now = today().and_hms_opt(9, 0, 0).unwrap();

        let evaluation = ReminderPolicy::new([7, 2]).evaluate(&mut table, today(), now);

        prop_assert_eq!(!evaluation.due.is_empty(), days == 7 || days == 2);
        prop_assert_eq!(table.get(0).unwrap().days_until, Some(days));
        prop_assert_eq!(&table.get(0).unwrap().status, &Status::Pending);
    }

    #[test]
    fn terminal_events_untouched(days in -30i64..30, failed in any::<bool>()) {
        let (status, error) = if failed { ("error", "Invalid email format") } else { ("successful", "") };
        let mut table = single_event(today() + Duration::days(days), status, error);
        let before = table.get(0).unwrap().clone();
        let now = today().and_hms_opt(9, 0, 0).unwrap();

        let evaluation = ReminderPolicy::new([7, 2]).evaluate(&mut table, today(), now);

        prop_assert!(evaluation.due.is_empty());
        prop_assert_eq!(table.get(0).unwrap(), &before);
    }

    #[test]
    fn save_preserves_foreign_columns(
        notes in proptest::collection::vec("[a-zA-Z0-9 ,\"]{0,12}", 1..6),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");

        let mut writer = csv::Writer::from_path(&path).unwrap();
        writer
            .write_record(["owner", "name", "date", "email", "status", "lastChecked", "error", "notes"])
            .unwrap();
        for (i, note) in notes.iter().enumerate() {
            let owner = format!("team-{i}");
            writer
                .write_record([owner.as_str(), "Launch", "2025-03-08", "a@example.com", "", "", "", note.as_str()])
                .unwrap();
        }
        writer.flush().unwrap();
        drop(writer);

        let store = CsvEventStore::new(&path);
        let mut table = store.load().unwrap();
        let now = today().and_hms_opt(9, 0, 0).unwrap();
        for event in table.events_mut() {
            event.mark_successful(now);
        }
        store.save(&table).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        prop_assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["owner", "name", "date", "email", "status", "lastChecked", "error", "notes"]
        );
        for (i, record) in reader.records().enumerate() {
            let record = record.unwrap();
            let owner = format!("team-{i}");
            prop_assert_eq!(record.get(0).unwrap(), owner.as_str());
            prop_assert_eq!(record.get(2).unwrap(), "2025-03-08");
            prop_assert_eq!(record.get(4).unwrap(), "successful");
            prop_assert_eq!(record.get(5).unwrap(), "2025-03-01 09:00:00");
            prop_assert_eq!(record.get(7).unwrap(), notes[i].as_str());
        }
    }
}
