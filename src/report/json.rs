use crate::error::Result;
use crate::report::SummaryData;

pub fn render_summary_json(data: &SummaryData) -> Result<String> {
    let mut out = serde_json::to_string_pretty(data)?;
    out.push('\n');
    Ok(out)
}
