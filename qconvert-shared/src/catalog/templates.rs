/// Workflow template catalog
///
/// Using a template copies its steps into a new draft workflow. Step IDs are
/// assigned at materialization time and every step starts `pending`.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::models::workflow::{StepStatus, StepType, WorkflowStep};

/// A step as described by a template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub name: &'static str,
    pub config: JsonValue,
}

/// A reusable workflow blueprint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub steps: Vec<TemplateStep>,
}

impl WorkflowTemplate {
    /// Copies the template's steps into fresh pending workflow steps
    pub fn materialize_steps(&self) -> Vec<WorkflowStep> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| WorkflowStep {
                id: format!("step-{}", i + 1),
                step_type: step.step_type,
                name: step.name.to_string(),
                status: StepStatus::Pending,
                config: step.config.clone(),
                result: None,
            })
            .collect()
    }
}

/// The immutable template list
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<WorkflowTemplate>,
}

impl TemplateCatalog {
    pub fn builtin() -> Self {
        let templates = vec![
            WorkflowTemplate {
                id: "qiskit-to-cirq",
                name: "Qiskit to Cirq Migration",
                description: "Convert a Qiskit circuit to Cirq and benchmark both versions",
                category: "conversion",
                steps: vec![
                    TemplateStep {
                        step_type: StepType::Convert,
                        name: "Convert Qiskit to Cirq",
                        config: json!({ "sourceLibrary": "qiskit", "targetLibrary": "cirq" }),
                    },
                    TemplateStep {
                        step_type: StepType::Benchmark,
                        name: "Benchmark converted circuit",
                        config: json!({ "shots": 1024 }),
                    },
                ],
            },
            WorkflowTemplate {
                id: "data-cleaning",
                name: "Data Cleaning Pipeline",
                description: "Clean an experiment dataset before analysis",
                category: "data",
                steps: vec![
                    TemplateStep {
                        step_type: StepType::Clean,
                        name: "Remove empty rows",
                        config: json!({ "dropEmpty": true }),
                    },
                    TemplateStep {
                        step_type: StepType::Clean,
                        name: "Normalize columns",
                        config: json!({ "normalize": true }),
                    },
                ],
            },
            WorkflowTemplate {
                id: "cross-platform-benchmark",
                name: "Cross-Platform Benchmark",
                description: "Convert one circuit to several libraries and benchmark each",
                category: "benchmark",
                steps: vec![
                    TemplateStep {
                        step_type: StepType::Convert,
                        name: "Convert to PennyLane",
                        config: json!({ "sourceLibrary": "qiskit", "targetLibrary": "pennylane" }),
                    },
                    TemplateStep {
                        step_type: StepType::Convert,
                        name: "Convert to Braket",
                        config: json!({ "sourceLibrary": "qiskit", "targetLibrary": "braket" }),
                    },
                    TemplateStep {
                        step_type: StepType::Benchmark,
                        name: "Compare execution",
                        config: json!({ "shots": 2048, "providers": ["ibm", "aws"] }),
                    },
                ],
            },
        ];

        Self { templates }
    }

    pub fn all(&self) -> &[WorkflowTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }
}
