use crate::core::assessment::Assessment;
use crate::input::Input;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AssessmentId = u64;

/// The scenarios of one assessment as persisted: scenario name to input record.
pub type Project = IndexMap<String, Input>;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AssessmentSummary {
    pub id: AssessmentId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("No assessment with id {0}")]
    UnknownAssessment(AssessmentId),
}

/// Where assessments are kept between calculations. Only inputs are stored; results are always
/// recalculated from them.
pub trait AssessmentStore: Send + Sync {
    fn list(&self) -> Vec<AssessmentSummary>;
    fn get(&self, id: AssessmentId) -> Result<Project, StoreError>;
    fn create(&self, name: &str, description: &str) -> AssessmentId;
    fn delete(&self, id: AssessmentId) -> Result<(), StoreError>;
    /// Replace the stored scenarios of an assessment with the inputs of the given records.
    fn set(
        &self,
        id: AssessmentId,
        scenarios: &IndexMap<String, Assessment>,
    ) -> Result<(), StoreError>;
}

#[derive(Debug)]
struct StoredAssessment {
    summary: AssessmentSummary,
    project: Project,
}

#[derive(Debug, Default)]
struct Assessments {
    next_id: AssessmentId,
    by_id: IndexMap<AssessmentId, StoredAssessment>,
}

/// An `AssessmentStore` held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    assessments: RwLock<Assessments>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl AssessmentStore for InMemoryStore {
    fn list(&self) -> Vec<AssessmentSummary> {
        self.assessments
            .read()
            .by_id
            .values()
            .map(|stored| stored.summary.clone())
            .collect()
    }

    fn get(&self, id: AssessmentId) -> Result<Project, StoreError> {
        self.assessments
            .read()
            .by_id
            .get(&id)
            .map(|stored| stored.project.clone())
            .ok_or(StoreError::UnknownAssessment(id))
    }

    fn create(&self, name: &str, description: &str) -> AssessmentId {
        let mut assessments = self.assessments.write();
        assessments.next_id += 1;
        let id = assessments.next_id;
        assessments.by_id.insert(
            id,
            StoredAssessment {
                summary: AssessmentSummary {
                    id,
                    name: name.to_string(),
                    description: description.to_string(),
                },
                project: Default::default(),
            },
        );

        id
    }

    fn delete(&self, id: AssessmentId) -> Result<(), StoreError> {
        self.assessments
            .write()
            .by_id
            .shift_remove(&id)
            .map(|_| ())
            .ok_or(StoreError::UnknownAssessment(id))
    }

    fn set(
        &self,
        id: AssessmentId,
        scenarios: &IndexMap<String, Assessment>,
    ) -> Result<(), StoreError> {
        let mut assessments = self.assessments.write();
        let stored = assessments
            .by_id
            .get_mut(&id)
            .ok_or(StoreError::UnknownAssessment(id))?;
        stored.project = scenarios
            .iter()
            .map(|(scenario, assessment)| (scenario.clone(), assessment.input.clone()))
            .collect();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::Pipeline;
    use crate::input::InputForProcessing;
    use crate::reference_data::ReferenceData;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    #[fixture]
    fn assessment() -> Assessment {
        let reference_data = ReferenceData::sap_2012().unwrap();
        let pipeline = Pipeline::standard();
        let input = pipeline
            .prepare(
                InputForProcessing::init_with_value(json!({
                    "scenario_name": "Base",
                    "floors": [{"area": 50, "height": 2.5}]
                }))
                .unwrap(),
                &reference_data,
            )
            .unwrap();
        pipeline.run(input, &reference_data).unwrap()
    }

    #[rstest]
    fn should_create_list_and_delete() {
        let store = InMemoryStore::new();
        let first = store.create("Cottage", "Before retrofit");
        let second = store.create("Flat", "");

        assert_ne!(first, second);
        assert_eq!(
            store
                .list()
                .iter()
                .map(|summary| summary.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Cottage", "Flat"]
        );

        store.delete(first).unwrap();
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.delete(first), Err(StoreError::UnknownAssessment(first)));
        assert_eq!(store.get(first), Err(StoreError::UnknownAssessment(first)));
    }

    #[rstest]
    fn should_store_only_inputs(assessment: Assessment) {
        let store = InMemoryStore::new();
        let id = store.create("Cottage", "");
        assert!(store.get(id).unwrap().is_empty());

        let scenarios = IndexMap::from([("master".to_string(), assessment.clone())]);
        store.set(id, &scenarios).unwrap();

        let project = store.get(id).unwrap();
        assert_eq!(project["master"], assessment.input);
        // the stored record carries no calculated values
        let stored = serde_json::to_value(&project["master"]).unwrap();
        assert!(stored.get("TFA").is_none());
        assert!(stored.get("fuel_totals").is_none());
    }

    #[rstest]
    fn should_refuse_to_set_unknown_assessment(assessment: Assessment) {
        let store = InMemoryStore::new();
        let scenarios = IndexMap::from([("master".to_string(), assessment)]);

        assert_eq!(store.set(7, &scenarios), Err(StoreError::UnknownAssessment(7)));
    }
}
