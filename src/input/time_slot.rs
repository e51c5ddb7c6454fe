//! Code for reading in time slot info from a CSV file.
use super::*;
use crate::time_slot::{Month, TimeSlot, TimeSlotData, TimeSlotInfo};
use crate::units::Hours;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const TIME_SLOTS_FILE_NAME: &str = "time_slots.csv";

/// A time slot record retrieved from a CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct TimeSlotRaw {
    slot: u32,
    month: u32,
    weight: f64,
}

/// Read time slot information from an iterator of raw time slot records.
///
/// Records are kept in the order they are read, which defines the cyclic order of the horizon.
fn read_time_slot_info_from_iter<I>(iter: I) -> Result<TimeSlotInfo>
where
    I: Iterator<Item = TimeSlotRaw>,
{
    let mut slots = IndexMap::new();
    for record in iter {
        let slot = TimeSlot(record.slot);
        let data = TimeSlotData {
            month: Month(record.month),
            weight: Hours(record.weight),
        };
        ensure!(
            slots.insert(slot, data).is_none(),
            "Duplicate time slot entry for {slot}"
        );
    }

    TimeSlotInfo::new(slots)
}

/// Read time slots from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_time_slot_info(model_dir: &Path) -> Result<TimeSlotInfo> {
    let file_path = model_dir.join(TIME_SLOTS_FILE_NAME);
    let time_slots_csv = read_csv(&file_path)?;
    read_time_slot_info_from_iter(time_slots_csv).with_context(|| input_err_msg(&file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use itertools::assert_equal;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_time_slot_info() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(TIME_SLOTS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "slot,month,weight
3,1,2.0
1,1,2.0
2,2,4.0"
            )
            .unwrap();
        }

        let info = read_time_slot_info(dir.path()).unwrap();
        assert_equal(
            info.iter_ids().copied(),
            [TimeSlot(3), TimeSlot(1), TimeSlot(2)],
        );
        assert_eq!(info.previous(&TimeSlot(3)).unwrap(), &TimeSlot(2));
        assert_eq!(info.total_hours(), Hours(8.0));
    }

    #[test]
    fn test_read_time_slot_info_duplicate() {
        let records = [
            TimeSlotRaw {
                slot: 1,
                month: 1,
                weight: 1.0,
            },
            TimeSlotRaw {
                slot: 1,
                month: 2,
                weight: 1.0,
            },
        ];
        assert_error!(
            read_time_slot_info_from_iter(records.into_iter()),
            "Duplicate time slot entry for 1"
        );
    }

    #[test]
    fn test_read_time_slot_info_bad_weight() {
        let records = [TimeSlotRaw {
            slot: 1,
            month: 1,
            weight: 0.0,
        }];
        assert_error!(
            read_time_slot_info_from_iter(records.into_iter()),
            "Weight for time slot 1 must be a finite number greater than zero"
        );
    }
}
