use crate::error::TimecodeError;

const FIELD_WEIGHTS: [u64; 3] = [3600, 60, 1];

/// Parse an `H:M:S` timecode into whole seconds.
///
/// Fields are weighted most-significant first, so `"5:30"` reads as five hours
/// and thirty minutes, not five minutes and thirty seconds. Individual fields are
/// not range checked: `"0:90:00"` is 5400.
///
/// # Errors
///
/// Fails on an empty input, more than three fields, a non-numeric field, or a total past `u64::MAX`.
pub fn parse_timecode(input: &str) -> Result<u64, TimecodeError> {
	let trimmed = input.trim();
	if trimmed.is_empty() {
		return Err(TimecodeError::Empty);
	}

	let fields: Vec<&str> = trimmed.split(':').collect();
	if fields.len() > FIELD_WEIGHTS.len() {
		return Err(TimecodeError::TooManyFields(trimmed.to_string()));
	}

	fields.iter().zip(FIELD_WEIGHTS).try_fold(0u64, |total, (field, weight)| {
		let field = field.trim();
		if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
			return Err(TimecodeError::InvalidField {
				input: trimmed.to_string(),
				field: field.to_string(),
			});
		}
		let value: u64 = field.parse().map_err(|_| TimecodeError::Overflow(trimmed.to_string()))?;
		value
			.checked_mul(weight)
			.and_then(|v| total.checked_add(v))
			.ok_or_else(|| TimecodeError::Overflow(trimmed.to_string()))
	})
}

/// Render whole seconds as `H:MM:SS`. Hours are not padded and never roll over into days.
#[must_use]
pub fn format_timecode(seconds: u64) -> String {
	let hours = seconds / 3600;
	let minutes = (seconds % 3600) / 60;
	let secs = seconds % 60;
	format!("{hours}:{minutes:02}:{secs:02}")
}
