//! `frcpm risk`: risk assessment plus schedule recommendations.
//!
//! Recommendations need a critical path, so they are left out when the graph
//! has a cycle; the assessment itself still reports the cycle.

use super::{label, render};
use crate::cli::OutputFormat;
use crate::errors::CliResult;
use crate::project_file::LoadedProject;
use frcpm_dependency_graph::{Error, RiskAssessment, ScheduleRecommendations};
use serde::Serialize;
use std::fmt::Write;
use tracing::warn;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskReport {
    pub assessment: RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<ScheduleRecommendations>,
}

impl RiskReport {
    pub fn build(project: &LoadedProject) -> CliResult<Self> {
        let graph = &project.graph;
        let assessment = graph.assess_risk(&project.tasks, &project.schedule)?;
        let recommendations = match graph.optimize_schedule(&project.tasks, &project.schedule) {
            Ok(recommendations) => Some(recommendations),
            Err(Error::CycleDetected { message }) => {
                warn!(%message, "Skipping recommendations for cyclic graph");
                None
            }
            Err(error) => return Err(error.into()),
        };
        Ok(Self {
            assessment,
            recommendations,
        })
    }

    fn render_text(&self, project: &LoadedProject) -> String {
        let assessment = &self.assessment;
        let mut out = format!("Risk level: {}\n", assessment.level);
        for factor in &assessment.factors {
            let _ = writeln!(out, "  - {factor}");
        }
        if !assessment.high_risk_tasks.is_empty() {
            let tasks: Vec<String> = assessment
                .high_risk_tasks
                .iter()
                .map(|&task| label(&project.tasks, task))
                .collect();
            let _ = writeln!(out, "High-risk tasks: {}", tasks.join(", "));
        }

        match &self.recommendations {
            Some(recommendations) if !recommendations.recommendations.is_empty() => {
                out.push_str("Recommendations:\n");
                for recommendation in &recommendations.recommendations {
                    let _ = writeln!(out, "  - {recommendation}");
                }
                if recommendations.potential_reduction_hours > 0.0 {
                    let _ = writeln!(
                        out,
                        "Potential reduction: {:.1}h",
                        recommendations.potential_reduction_hours
                    );
                }
            }
            Some(_) => out.push_str("No recommendations\n"),
            None => out.push_str("Recommendations unavailable: resolve the cycle first\n"),
        }
        out
    }
}

pub fn execute(project: &LoadedProject, format: OutputFormat) -> CliResult<String> {
    let report = RiskReport::build(project)?;
    render(format, &report, |report| report.render_text(project))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use frcpm_dependency_graph::{NewDependency, RiskLevel, TaskId};
    use std::sync::Arc;

    #[test]
    fn test_gearbox_risk() {
        let report = RiskReport::build(&fixtures::gearbox()).unwrap();
        assert_eq!(report.assessment.level, RiskLevel::Medium);
        assert_eq!(report.assessment.high_risk_tasks, vec![TaskId(4)]);

        let recommendations = report.recommendations.unwrap();
        assert!(recommendations.recommendations.contains(
            &"Review lag time for dependency: 'Order bearings' (#2) -> 'Assemble' (#4)".to_string()
        ));
        assert!((recommendations.potential_reduction_hours - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_output() {
        let output = execute(&fixtures::gearbox(), OutputFormat::Text).unwrap();
        assert!(output.starts_with("Risk level: MEDIUM\n"));
        assert!(output.contains("High-risk tasks: 'Assemble' (#4)"));
        assert!(output.contains("Potential reduction: 24.0h"));
    }

    #[test]
    fn test_cycle_is_critical_without_recommendations() {
        let mut project = fixtures::gearbox();
        let mut graph = (*project.graph).clone();
        graph.deactivate_dependencies_for_task(TaskId(4));
        graph
            .add_dependency(&project.tasks, NewDependency::new(TaskId(2), TaskId(5)))
            .unwrap();
        graph.reactivate_dependencies_for_task(TaskId(4));
        project.graph = Arc::new(graph);

        let report = RiskReport::build(&project).unwrap();
        assert_eq!(report.assessment.level, RiskLevel::Critical);
        assert!(report.recommendations.is_none());

        let output = report.render_text(&project);
        assert!(output.contains("Circular dependencies detected"));
        assert!(output.contains("resolve the cycle first"));
    }
}
