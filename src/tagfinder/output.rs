//! Plain-text result table.

use tagfinder::RankedTarget;

const NAME_WIDTH: usize = 40;

/// Rank-ordered distance/name/phone table, cut after `max_rows` rows
pub fn render_table(targets: &[RankedTarget], phones: &[String], max_rows: usize) -> String {
    let mut out = format!("\n distance{:<44}Phone\n\n", "    Name");

    for (target, phone) in targets.iter().zip(phones).take(max_rows) {
        out.push_str(&format!(
            "{:.2} km    {:<width$}{}\n",
            target.distance_km,
            target.name,
            phone,
            width = NAME_WIDTH
        ));
    }

    if targets.len() > max_rows {
        out.push_str(&format!(" ... ({} more)\n", targets.len() - max_rows));
    }
    out
}
