//! Study/trial datastore for long-running optimization campaigns.
//!
//! CRUD-level persistence contract: studies (scoped by owner), their
//! trials, suggestion operations and early-stopping operations, plus
//! free-form study metadata. All accessors are pass-by-value: returned
//! objects are snapshots, mutating them does not affect the store.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{OptibenchError, Result};
use crate::types::{ProblemStatement, Trial};

/// A named optimization campaign owned by a user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub owner: String,
    pub name: String,
    pub problem: ProblemStatement,
    pub metadata: BTreeMap<String, String>,
}

impl Study {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, problem: ProblemStatement) -> Self {
        Study {
            owner: owner.into(),
            name: name.into(),
            problem,
            metadata: BTreeMap::new(),
        }
    }

    /// Fully qualified study name, `"{owner}/{study}"`
    pub fn resource_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A pending or resolved suggestion request issued by a client
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestionOperation {
    pub owner: String,
    pub client_id: String,
    pub operation_number: u64,
    pub done: bool,
    pub payload: String,
}

/// A decision record on whether a trial should be stopped early
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingOperation {
    pub study_name: String,
    pub trial_id: u64,
    pub should_stop: bool,
}

/// Persistence contract for studies, trials and operations
pub trait DataStore {
    fn create_study(&mut self, study: Study) -> Result<()>;
    fn load_study(&self, study_name: &str) -> Result<Study>;
    fn update_study(&mut self, study: Study) -> Result<()>;
    fn delete_study(&mut self, study_name: &str) -> Result<()>;
    /// All studies belonging to `owner`, in name order
    fn list_studies(&self, owner: &str) -> Result<Vec<Study>>;

    fn create_trial(&mut self, study_name: &str, trial: Trial) -> Result<()>;
    fn get_trial(&self, study_name: &str, trial_id: u64) -> Result<Trial>;
    fn update_trial(&mut self, study_name: &str, trial: Trial) -> Result<()>;
    fn delete_trial(&mut self, study_name: &str, trial_id: u64) -> Result<()>;
    fn list_trials(&self, study_name: &str) -> Result<Vec<Trial>>;
    /// Largest trial id ever created in the study, 0 when none
    fn max_trial_id(&self, study_name: &str) -> Result<u64>;

    fn create_suggestion_operation(&mut self, operation: SuggestionOperation) -> Result<()>;
    fn get_suggestion_operation(
        &self,
        owner: &str,
        client_id: &str,
        operation_number: u64,
    ) -> Result<SuggestionOperation>;
    fn update_suggestion_operation(&mut self, operation: SuggestionOperation) -> Result<()>;
    fn list_suggestion_operations(
        &self,
        owner: &str,
        client_id: &str,
    ) -> Result<Vec<SuggestionOperation>>;
    /// Largest operation number for the owner/client pair, 0 when none
    fn max_suggestion_operation_number(&self, owner: &str, client_id: &str) -> Result<u64>;

    fn create_early_stopping_operation(&mut self, operation: EarlyStoppingOperation) -> Result<()>;
    fn get_early_stopping_operation(
        &self,
        study_name: &str,
        trial_id: u64,
    ) -> Result<EarlyStoppingOperation>;

    /// Set one metadata key on an existing study
    fn update_metadata(&mut self, study_name: &str, key: &str, value: &str) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct StudyRecord {
    study: Study,
    trials: BTreeMap<u64, Trial>,
    max_trial_id: u64,
    early_stopping: BTreeMap<u64, EarlyStoppingOperation>,
}

impl StudyRecord {
    fn new(study: Study) -> Self {
        StudyRecord {
            study,
            trials: BTreeMap::new(),
            max_trial_id: 0,
            early_stopping: BTreeMap::new(),
        }
    }
}

fn ops_key(owner: &str, client_id: &str) -> String {
    format!("{owner}/{client_id}")
}

/// In-memory datastore, snapshottable to JSON
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InMemoryDataStore {
    studies: BTreeMap<String, StudyRecord>,
    // keyed by "owner/client_id" then operation number
    suggestion_ops: BTreeMap<String, BTreeMap<u64, SuggestionOperation>>,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        InMemoryDataStore::default()
    }

    fn record(&self, study_name: &str) -> Result<&StudyRecord> {
        self.studies
            .get(study_name)
            .ok_or_else(|| OptibenchError::NotFound(format!("study '{study_name}'")))
    }

    fn record_mut(&mut self, study_name: &str) -> Result<&mut StudyRecord> {
        self.studies
            .get_mut(study_name)
            .ok_or_else(|| OptibenchError::NotFound(format!("study '{study_name}'")))
    }

    /// Snapshot the whole store to a JSON file
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Restore a store from a JSON snapshot
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl DataStore for InMemoryDataStore {
    fn create_study(&mut self, study: Study) -> Result<()> {
        let name = study.resource_name();
        if self.studies.contains_key(&name) {
            return Err(OptibenchError::AlreadyExists(format!("study '{name}'")));
        }
        self.studies.insert(name, StudyRecord::new(study));
        Ok(())
    }

    fn load_study(&self, study_name: &str) -> Result<Study> {
        Ok(self.record(study_name)?.study.clone())
    }

    fn update_study(&mut self, study: Study) -> Result<()> {
        let name = study.resource_name();
        self.record_mut(&name)?.study = study;
        Ok(())
    }

    fn delete_study(&mut self, study_name: &str) -> Result<()> {
        self.studies
            .remove(study_name)
            .map(|_| ())
            .ok_or_else(|| OptibenchError::NotFound(format!("study '{study_name}'")))
    }

    fn list_studies(&self, owner: &str) -> Result<Vec<Study>> {
        Ok(self
            .studies
            .values()
            .filter(|r| r.study.owner == owner)
            .map(|r| r.study.clone())
            .collect())
    }

    fn create_trial(&mut self, study_name: &str, trial: Trial) -> Result<()> {
        let record = self.record_mut(study_name)?;
        if record.trials.contains_key(&trial.id) {
            return Err(OptibenchError::AlreadyExists(format!(
                "trial {} in study '{study_name}'",
                trial.id
            )));
        }
        record.max_trial_id = record.max_trial_id.max(trial.id);
        record.trials.insert(trial.id, trial);
        Ok(())
    }

    fn get_trial(&self, study_name: &str, trial_id: u64) -> Result<Trial> {
        self.record(study_name)?
            .trials
            .get(&trial_id)
            .cloned()
            .ok_or_else(|| {
                OptibenchError::NotFound(format!("trial {trial_id} in study '{study_name}'"))
            })
    }

    fn update_trial(&mut self, study_name: &str, trial: Trial) -> Result<()> {
        let record = self.record_mut(study_name)?;
        match record.trials.get_mut(&trial.id) {
            Some(existing) => {
                *existing = trial;
                Ok(())
            }
            None => Err(OptibenchError::NotFound(format!(
                "trial {} in study '{study_name}'",
                trial.id
            ))),
        }
    }

    fn delete_trial(&mut self, study_name: &str, trial_id: u64) -> Result<()> {
        self.record_mut(study_name)?
            .trials
            .remove(&trial_id)
            .map(|_| ())
            .ok_or_else(|| {
                OptibenchError::NotFound(format!("trial {trial_id} in study '{study_name}'"))
            })
    }

    fn list_trials(&self, study_name: &str) -> Result<Vec<Trial>> {
        Ok(self.record(study_name)?.trials.values().cloned().collect())
    }

    fn max_trial_id(&self, study_name: &str) -> Result<u64> {
        Ok(self.record(study_name)?.max_trial_id)
    }

    fn create_suggestion_operation(&mut self, operation: SuggestionOperation) -> Result<()> {
        let key = ops_key(&operation.owner, &operation.client_id);
        let ops = self.suggestion_ops.entry(key).or_default();
        if ops.contains_key(&operation.operation_number) {
            return Err(OptibenchError::AlreadyExists(format!(
                "suggestion operation {} for {}/{}",
                operation.operation_number, operation.owner, operation.client_id
            )));
        }
        ops.insert(operation.operation_number, operation);
        Ok(())
    }

    fn get_suggestion_operation(
        &self,
        owner: &str,
        client_id: &str,
        operation_number: u64,
    ) -> Result<SuggestionOperation> {
        self.suggestion_ops
            .get(&ops_key(owner, client_id))
            .and_then(|ops| ops.get(&operation_number))
            .cloned()
            .ok_or_else(|| {
                OptibenchError::NotFound(format!(
                    "suggestion operation {operation_number} for {owner}/{client_id}"
                ))
            })
    }

    fn update_suggestion_operation(&mut self, operation: SuggestionOperation) -> Result<()> {
        let key = ops_key(&operation.owner, &operation.client_id);
        match self
            .suggestion_ops
            .get_mut(&key)
            .and_then(|ops| ops.get_mut(&operation.operation_number))
        {
            Some(existing) => {
                *existing = operation;
                Ok(())
            }
            None => Err(OptibenchError::NotFound(format!(
                "suggestion operation {} for {}/{}",
                operation.operation_number, operation.owner, operation.client_id
            ))),
        }
    }

    fn list_suggestion_operations(
        &self,
        owner: &str,
        client_id: &str,
    ) -> Result<Vec<SuggestionOperation>> {
        Ok(self
            .suggestion_ops
            .get(&ops_key(owner, client_id))
            .map(|ops| ops.values().cloned().collect())
            .unwrap_or_default())
    }

    fn max_suggestion_operation_number(&self, owner: &str, client_id: &str) -> Result<u64> {
        Ok(self
            .suggestion_ops
            .get(&ops_key(owner, client_id))
            .and_then(|ops| ops.keys().next_back().copied())
            .unwrap_or(0))
    }

    fn create_early_stopping_operation(&mut self, operation: EarlyStoppingOperation) -> Result<()> {
        let record = self.record_mut(&operation.study_name)?;
        if record.early_stopping.contains_key(&operation.trial_id) {
            return Err(OptibenchError::AlreadyExists(format!(
                "early stopping operation for trial {} in study '{}'",
                operation.trial_id, operation.study_name
            )));
        }
        record.early_stopping.insert(operation.trial_id, operation);
        Ok(())
    }

    fn get_early_stopping_operation(
        &self,
        study_name: &str,
        trial_id: u64,
    ) -> Result<EarlyStoppingOperation> {
        self.record(study_name)?
            .early_stopping
            .get(&trial_id)
            .cloned()
            .ok_or_else(|| {
                OptibenchError::NotFound(format!(
                    "early stopping operation for trial {trial_id} in study '{study_name}'"
                ))
            })
    }

    fn update_metadata(&mut self, study_name: &str, key: &str, value: &str) -> Result<()> {
        self.record_mut(study_name)?
            .study
            .metadata
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetricGoal, MetricInformation, SearchSpace};

    fn problem() -> ProblemStatement {
        ProblemStatement::new(
            SearchSpace::new(vec![(0., 1.)]),
            vec![MetricInformation::new("obj", MetricGoal::Maximize)],
        )
    }

    fn study(owner: &str, name: &str) -> Study {
        Study::new(owner, name, problem())
    }

    #[test]
    fn test_study_api() {
        let mut ds = InMemoryDataStore::new();
        let s = study("alice", "s1");
        ds.create_study(s.clone()).unwrap();

        let copied = ds.load_study("alice/s1").unwrap();
        assert_eq!(copied, s);

        // pass-by-value: mutating the copy does not touch the store
        let mut mutated = copied;
        mutated.metadata.insert("k".into(), "v".into());
        assert_eq!(ds.load_study("alice/s1").unwrap(), s);

        assert_eq!(ds.list_studies("alice").unwrap(), vec![s.clone()]);
        assert!(ds.list_studies("bob").unwrap().is_empty());

        assert!(matches!(
            ds.create_study(s),
            Err(OptibenchError::AlreadyExists(_))
        ));

        ds.delete_study("alice/s1").unwrap();
        assert!(ds.list_studies("alice").unwrap().is_empty());
        assert!(matches!(
            ds.load_study("alice/s1"),
            Err(OptibenchError::NotFound(_))
        ));
    }

    #[test]
    fn test_trial_api() {
        let mut ds = InMemoryDataStore::new();
        ds.create_study(study("alice", "s1")).unwrap();
        let trials: Vec<Trial> = (1..=3).map(|i| Trial::new(i, vec![i as f64])).collect();
        for trial in &trials {
            ds.create_trial("alice/s1", trial.clone()).unwrap();
            assert_eq!(ds.get_trial("alice/s1", trial.id).unwrap(), *trial);
        }
        assert_eq!(ds.max_trial_id("alice/s1").unwrap(), 3);
        assert_eq!(ds.list_trials("alice/s1").unwrap(), trials);

        let mut first = trials[0].clone();
        first.parameters = vec![42.];
        ds.update_trial("alice/s1", first.clone()).unwrap();
        assert_eq!(ds.get_trial("alice/s1", 1).unwrap(), first);

        ds.delete_trial("alice/s1", 1).unwrap();
        assert_eq!(ds.list_trials("alice/s1").unwrap(), trials[1..].to_vec());
        // max id is not reclaimed by deletion
        assert_eq!(ds.max_trial_id("alice/s1").unwrap(), 3);

        assert!(matches!(
            ds.get_trial("alice/s1", 1),
            Err(OptibenchError::NotFound(_))
        ));
        assert!(matches!(
            ds.create_trial("alice/missing", Trial::new(1, vec![])),
            Err(OptibenchError::NotFound(_))
        ));
    }

    #[test]
    fn test_suggestion_operation_api() {
        let mut ds = InMemoryDataStore::new();
        let ops: Vec<SuggestionOperation> = (1..=3)
            .map(|i| SuggestionOperation {
                owner: "alice".into(),
                client_id: "client".into(),
                operation_number: i,
                done: false,
                payload: format!("op-{i}"),
            })
            .collect();
        for op in &ops {
            ds.create_suggestion_operation(op.clone()).unwrap();
        }
        assert_eq!(
            ds.max_suggestion_operation_number("alice", "client").unwrap(),
            3
        );
        assert_eq!(
            ds.list_suggestion_operations("alice", "client").unwrap(),
            ops
        );
        assert_eq!(
            ds.get_suggestion_operation("alice", "client", 1).unwrap(),
            ops[0]
        );

        let mut updated = ops[0].clone();
        updated.done = true;
        ds.update_suggestion_operation(updated.clone()).unwrap();
        assert_eq!(
            ds.get_suggestion_operation("alice", "client", 1).unwrap(),
            updated
        );

        assert_eq!(
            ds.max_suggestion_operation_number("alice", "other").unwrap(),
            0
        );
        assert!(matches!(
            ds.get_suggestion_operation("alice", "client", 9),
            Err(OptibenchError::NotFound(_))
        ));
    }

    #[test]
    fn test_early_stopping_api() {
        let mut ds = InMemoryDataStore::new();
        ds.create_study(study("alice", "s1")).unwrap();
        ds.create_trial("alice/s1", Trial::new(1, vec![0.])).unwrap();
        let op = EarlyStoppingOperation {
            study_name: "alice/s1".into(),
            trial_id: 1,
            should_stop: true,
        };
        ds.create_early_stopping_operation(op.clone()).unwrap();
        assert_eq!(ds.get_early_stopping_operation("alice/s1", 1).unwrap(), op);
        assert!(matches!(
            ds.create_early_stopping_operation(op),
            Err(OptibenchError::AlreadyExists(_))
        ));
        assert!(matches!(
            ds.get_early_stopping_operation("alice/s1", 2),
            Err(OptibenchError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_metadata() {
        let mut ds = InMemoryDataStore::new();
        ds.create_study(study("alice", "s1")).unwrap();
        ds.update_metadata("alice/s1", "stage", "tuning").unwrap();
        let s = ds.load_study("alice/s1").unwrap();
        assert_eq!(s.metadata.get("stage").map(String::as_str), Some("tuning"));
    }

    #[test]
    fn test_json_snapshot_roundtrip() {
        let mut ds = InMemoryDataStore::new();
        ds.create_study(study("alice", "s1")).unwrap();
        ds.create_trial("alice/s1", Trial::new(1, vec![0.5])).unwrap();

        let path = std::env::temp_dir().join("optibench_datastore_test.json");
        ds.save_json(&path).unwrap();
        let restored = InMemoryDataStore::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.load_study("alice/s1").unwrap().name, "s1");
        assert_eq!(restored.list_trials("alice/s1").unwrap().len(), 1);
    }
}
