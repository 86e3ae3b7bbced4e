//! Lesson plans.

use super::coerce::{as_number, as_text, as_text_list, field, list_field, num_field, str_field};
use crate::error::{Result, ScholarError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonPlan {
    pub title: String,
    pub grade_level: String,
    pub duration_minutes: u32,
    pub objectives: Vec<String>,
    pub materials: Vec<String>,
    pub activities: Vec<Activity>,
    pub assessment: String,
    #[serde(default)]
    pub differentiation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub name: String,
    pub duration_minutes: u32,
    pub description: String,
}

fn parse_activity(value: &Value, order: usize) -> Option<Activity> {
    match value {
        Value::Object(obj) => {
            let name = str_field(obj, &["name", "title", "activity", "step"])
                .unwrap_or_else(|| format!("Activity {}", order + 1));
            let description =
                str_field(obj, &["description", "details", "instructions", "content"]).unwrap_or_default();
            if description.is_empty() && str_field(obj, &["name", "title", "activity", "step"]).is_none() {
                return None;
            }
            let duration_minutes = num_field(obj, &["duration_minutes", "duration", "time", "minutes"])
                .map(|m| m.round() as u32)
                .unwrap_or(0);
            Some(Activity {
                name,
                duration_minutes,
                description,
            })
        }
        other => as_text(other).map(|text| Activity {
            name: format!("Activity {}", order + 1),
            duration_minutes: 0,
            description: text,
        }),
    }
}

/// Text that may come back as a string or a list of strings.
fn text_or_list(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(_)) => as_text_list(value.unwrap_or(&Value::Null)).join("\n"),
        Some(v) => as_text(v).unwrap_or_default(),
        None => String::new(),
    }
}

/// Coerce a model reply into a lesson plan.
pub fn coerce_lesson_plan(value: &Value, topic: &str, grade_level: Option<&str>) -> Result<LessonPlan> {
    let obj = match value {
        Value::Object(obj) => match obj.get("lesson_plan").or_else(|| obj.get("lesson")) {
            Some(Value::Object(inner)) => inner,
            _ => obj,
        },
        _ => return Err(ScholarError::Parse("lesson plan reply is not an object".to_string())),
    };

    let objectives = list_field(obj, &["objectives", "learning_objectives", "goals"]);
    let activities: Vec<Activity> = field(obj, &["activities", "procedure", "steps", "agenda"])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| parse_activity(v, i))
                .collect()
        })
        .unwrap_or_default();

    if objectives.is_empty() && activities.is_empty() {
        return Err(ScholarError::Parse(
            "lesson plan reply has neither objectives nor activities".to_string(),
        ));
    }

    let duration_minutes = field(obj, &["duration_minutes", "duration", "total_minutes", "length"])
        .and_then(as_number)
        .map(|m| m.round() as u32)
        .unwrap_or_else(|| activities.iter().map(|a| a.duration_minutes).sum());

    Ok(LessonPlan {
        title: str_field(obj, &["title", "name"]).unwrap_or_else(|| format!("Lesson: {}", topic)),
        grade_level: str_field(obj, &["grade_level", "grade", "audience", "level"])
            .or_else(|| grade_level.map(str::to_string))
            .unwrap_or_else(|| "General".to_string()),
        duration_minutes,
        objectives,
        materials: list_field(obj, &["materials", "resources", "supplies"]),
        activities,
        assessment: text_or_list(field(obj, &["assessment", "evaluation", "assessments"])),
        differentiation: text_or_list(field(obj, &["differentiation", "accommodations", "extensions"])),
    })
}

impl LessonPlan {
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# {}\n\n**Grade level:** {}  \n**Duration:** {} minutes\n",
            self.title, self.grade_level, self.duration_minutes
        );

        if !self.objectives.is_empty() {
            out.push_str("\n## Objectives\n\n");
            for o in &self.objectives {
                out.push_str(&format!("- {}\n", o));
            }
        }
        if !self.materials.is_empty() {
            out.push_str("\n## Materials\n\n");
            for m in &self.materials {
                out.push_str(&format!("- {}\n", m));
            }
        }
        if !self.activities.is_empty() {
            out.push_str("\n## Activities\n");
            for (i, a) in self.activities.iter().enumerate() {
                if a.duration_minutes > 0 {
                    out.push_str(&format!("\n### {}. {} ({} min)\n\n", i + 1, a.name, a.duration_minutes));
                } else {
                    out.push_str(&format!("\n### {}. {}\n\n", i + 1, a.name));
                }
                if !a.description.is_empty() {
                    out.push_str(&format!("{}\n", a.description));
                }
            }
        }
        if !self.assessment.is_empty() {
            out.push_str(&format!("\n## Assessment\n\n{}\n", self.assessment));
        }
        if !self.differentiation.is_empty() {
            out.push_str(&format!("\n## Differentiation\n\n{}\n", self.differentiation));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_with_string_numbers_and_summed_duration() {
        let value = json!({
            "lesson_plan": {
                "title": "Photosynthesis",
                "objectives": "Explain inputs and outputs\nLabel a chloroplast",
                "activities": [
                    {"title": "Hook", "time": "5 minutes", "details": "Show a wilting plant"},
                    {"name": "Lab", "duration": 30, "description": "Leaf disk assay"},
                    "Exit ticket"
                ],
                "assessment": ["Exit ticket", "Lab report"]
            }
        });

        let plan = coerce_lesson_plan(&value, "photosynthesis", Some("Grade 7")).unwrap();
        assert_eq!(plan.title, "Photosynthesis");
        assert_eq!(plan.grade_level, "Grade 7");
        assert_eq!(plan.objectives.len(), 2);
        assert_eq!(plan.activities.len(), 3);
        assert_eq!(plan.activities[0].duration_minutes, 5);
        assert_eq!(plan.activities[2].name, "Activity 3");
        assert_eq!(plan.duration_minutes, 35);
        assert_eq!(plan.assessment, "Exit ticket\nLab report");
    }

    #[test]
    fn test_explicit_duration_wins() {
        let value = json!({"objectives": ["x"], "duration_minutes": "50 min", "grade_level": "High school"});
        let plan = coerce_lesson_plan(&value, "t", Some("ignored")).unwrap();
        assert_eq!(plan.duration_minutes, 50);
        assert_eq!(plan.grade_level, "High school");
        assert_eq!(plan.title, "Lesson: t");
    }

    #[test]
    fn test_empty_plan_is_parse_error() {
        assert!(matches!(
            coerce_lesson_plan(&json!({"title": "x"}), "t", None),
            Err(ScholarError::Parse(_))
        ));
        assert!(matches!(
            coerce_lesson_plan(&json!([1, 2]), "t", None),
            Err(ScholarError::Parse(_))
        ));
    }

    #[test]
    fn test_markdown_sections() {
        let plan = coerce_lesson_plan(
            &json!({"title": "T", "objectives": ["o1"], "activities": [{"name": "A", "duration_minutes": 10, "description": "d"}]}),
            "t",
            None,
        )
        .unwrap();
        let md = plan.to_markdown();
        assert!(md.contains("## Objectives"));
        assert!(md.contains("### 1. A (10 min)"));
        assert!(!md.contains("## Assessment"));
    }
}
