//! Default LLM prompts for structured attendance parsing.

/// Default prompt for turning OCR text into attendance JSON.
///
/// Placeholders: `{roster}`, `{aliases}`, `{content}`.
pub const DEFAULT_ATTENDANCE_PROMPT: &str = r#"You are reading the OCR text of a school attendance sheet. Match every line of the sheet to a student in the ROSTER and decide that student's attendance status.

ROSTER (id | registration number | name):
{roster}

STATUS MARKS used on the sheet:
{aliases}

RULES:
1. Only output students that appear in the ROSTER. Use the roster's id as studentId.
2. Prefer the registration number to identify a student; fall back to the name.
3. Map each mark to exactly one of: present, sick, permission, absent.
4. If the sheet shows a date, return it as YYYY-MM-DD. Otherwise return null.
5. confidence is your certainty for that line, from 0 to 100.

OCR TEXT:
{content}

Respond with ONLY a JSON object, no explanations or markdown:
{"date": "YYYY-MM-DD", "records": [{"studentId": "...", "registrationNumber": "...", "name": "...", "status": "present", "notes": null, "confidence": 90}]}"#;
