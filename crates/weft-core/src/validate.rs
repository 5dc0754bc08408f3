//! Workflow structure validation.
//!
//! Runs at registration time, before a definition is stored: step names
//! must be unique, every dependency must reference a step in the same
//! workflow, and the dependency graph must be acyclic.

use std::collections::HashMap;

use crate::definition::{WorkflowDefinition, WorkflowStep};
use crate::error::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Validate a definition's structure. O(steps + edges).
pub(crate) fn validate_definition(definition: &WorkflowDefinition) -> Result<(), RegistryError> {
    let mut index: HashMap<&str, &WorkflowStep> = HashMap::with_capacity(definition.steps.len());
    for step in &definition.steps {
        if index.insert(step.name.as_str(), step).is_some() {
            return Err(RegistryError::DuplicateStepName {
                workflow: definition.name.clone(),
                step: step.name.clone(),
            });
        }
    }

    for step in &definition.steps {
        for dependency in &step.depends_on {
            if !index.contains_key(dependency.as_str()) {
                return Err(RegistryError::UnknownDependency {
                    workflow: definition.name.clone(),
                    step: step.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    let mut marks: HashMap<&str, Mark> = index.keys().map(|name| (*name, Mark::Unvisited)).collect();
    for step in &definition.steps {
        if marks[step.name.as_str()] == Mark::Unvisited {
            visit(step.name.as_str(), &index, &mut marks, &definition.name)?;
        }
    }

    Ok(())
}

/// Depth-first traversal with three-color marking over `depends_on` edges.
fn visit<'a>(
    name: &'a str,
    index: &HashMap<&'a str, &'a WorkflowStep>,
    marks: &mut HashMap<&'a str, Mark>,
    workflow: &str,
) -> Result<(), RegistryError> {
    marks.insert(name, Mark::InProgress);

    for dependency in &index[name].depends_on {
        match marks[dependency.as_str()] {
            Mark::InProgress => {
                return Err(RegistryError::CyclicDependency {
                    workflow: workflow.to_string(),
                    step: dependency.clone(),
                });
            }
            Mark::Unvisited => visit(dependency.as_str(), index, marks, workflow)?,
            Mark::Done => {}
        }
    }

    marks.insert(name, Mark::Done);
    Ok(())
}
