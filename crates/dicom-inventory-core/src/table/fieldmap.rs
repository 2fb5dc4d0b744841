use super::InventoryRow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Separator between series UIDs of a merged field-map row.
pub const UID_SEPARATOR: &str = "|";

type GroupKey = (String, String, String, String, String, String);

fn base_key(row: &InventoryRow) -> (String, String, String, String, String) {
    (
        row.study_description.clone(),
        row.bids_name.clone(),
        row.session.clone(),
        row.source_folder.clone(),
        row.sequence.clone(),
    )
}

fn time_bucket(acq_time: &str, width: usize) -> String {
    acq_time.chars().take(width).collect()
}

/// Merge magnitude/phase field-map series that belong to one acquisition.
///
/// Field-map rows sharing subject, session, folder, description and the
/// first `time_bucket` characters of their acquisition time become one row:
/// UIDs joined, distinct image-type tags concatenated in sorted order, file
/// counts summed, include = max. Other fields come from the earliest member.
/// Merged rows are numbered per (subject, session, folder, description) when
/// more than one remains. Non-field-map rows pass through first, unchanged.
pub fn consolidate_fieldmaps(rows: Vec<InventoryRow>, time_bucket_width: usize) -> Vec<InventoryRow> {
    let (mut fieldmaps, mut others): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(InventoryRow::is_fieldmap);
    if fieldmaps.is_empty() {
        return others;
    }

    fieldmaps.sort_by(|a, b| {
        (base_key(a), &a.acq_time, &a.series_uid).cmp(&(base_key(b), &b.acq_time, &b.series_uid))
    });

    let mut groups: BTreeMap<GroupKey, Vec<InventoryRow>> = BTreeMap::new();
    for row in fieldmaps {
        let (study, subject, session, folder, sequence) = base_key(&row);
        let bucket = time_bucket(&row.acq_time, time_bucket_width);
        groups
            .entry((study, subject, session, folder, sequence, bucket))
            .or_default()
            .push(row);
    }

    let before = groups.values().map(Vec::len).sum::<usize>();
    let mut merged: Vec<InventoryRow> = groups.into_values().filter_map(merge_group).collect();
    debug!("Consolidated {} field-map series into {} rows", before, merged.len());

    merged.sort_by(|a, b| (base_key(a), &a.acq_time).cmp(&(base_key(b), &b.acq_time)));

    let mut totals: HashMap<_, u32> = HashMap::new();
    for row in &merged {
        *totals.entry(base_key(row)).or_default() += 1;
    }
    let mut running: HashMap<_, u32> = HashMap::new();
    for row in &mut merged {
        let key = base_key(row);
        let count = running.entry(key.clone()).or_default();
        *count += 1;
        row.rep = if totals[&key] > 1 { Some(*count) } else { None };
    }

    others.extend(merged);
    others
}

fn merge_group(members: Vec<InventoryRow>) -> Option<InventoryRow> {
    let mut iter = members.into_iter();
    let mut merged = iter.next()?;

    let mut uids = vec![merged.series_uid.clone()];
    let mut tags: BTreeSet<String> = BTreeSet::from([merged.image_type.clone()]);
    for row in iter {
        if !uids.contains(&row.series_uid) {
            uids.push(row.series_uid);
        }
        tags.insert(row.image_type);
        merged.n_files += row.n_files;
        merged.include = merged.include.max(row.include);
    }

    merged.series_uid = uids.join(UID_SEPARATOR);
    merged.image_type = tags.into_iter().collect();
    Some(merged)
}
