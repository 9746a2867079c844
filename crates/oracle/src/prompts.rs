//! Fixed instruction prompts sent alongside the images.

pub const CLASSIFICATION_PROMPT: &str = r#"You are a civic safety analyst for a public issue reporting system.
Analyze this image and classify the civic issue or emergency it shows.

CRITICAL EMERGENCIES (severity 9-10):
- Stampede, crowd crush, mass panic
- Building or infrastructure collapse, earthquake damage
- Fire, explosion, gas leak
- Flood, landslide
- Active threat, armed attack
- Major accident with casualties

HIGH PRIORITY (severity 7-8):
- Major road blockage, traffic accident
- Downed power lines, electrical hazard
- Water main break, flooded street
- Dangerous construction site
- Aggressive animals, wildlife threat

STANDARD (severity 1-6):
- Pothole, road damage
- Garbage overflow, illegal dumping
- Broken streetlight
- Water leakage
- Traffic violation
- Vandalism, graffiti

Return strictly JSON:
{
  "category": "short label for the issue, e.g. 'Fire', 'Pothole', 'Garbage'",
  "severityScore": integer 1-10 (9-10 only for critical emergencies),
  "description": "technical description of the situation and recommended action",
  "priority": "CRITICAL" | "HIGH" | "NORMAL" | "LOW",
  "isEmergency": boolean (true when severityScore >= 9)
}"#;

pub const COMPARISON_PROMPT: &str = r#"You are verifying duplicate civic issue reports.
The first image is a new report. The second image is an existing report.

Decide whether both photos show the SAME physical issue at the SAME location.
Different camera angles, distance, cropping, lighting, filters or edits of the
same scene still count as the same issue. Similar-looking issues at different
places (another pothole, another garbage pile) are NOT the same.

Return strictly JSON:
{
  "isSame": boolean,
  "confidence": integer 0-100,
  "reason": "one sentence explaining the decision"
}"#;

/// Translation prompt for free text entered by the reporter.
pub fn translation_prompt(text: &str) -> String {
    format!(
        "Translate the following Hindi text to English. If the text is already English, \
         return it as is. Return ONLY the translated text, with no preamble or quotes.\n\n\
         Text: \"{text}\""
    )
}
