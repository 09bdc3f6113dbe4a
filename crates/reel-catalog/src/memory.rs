//! In-memory implementation of the catalog store.
//!
//! Each transaction works on a snapshot of the committed state taken at
//! [`begin`](CatalogStore::begin) plus its own writes, and keeps a log of
//! those writes. Commit replays the log against the current committed state
//! under a lock, re-checking every constraint, so two transactions that both
//! passed their own uniqueness checks cannot both commit a duplicate.
//!
//! Identities come from per-kind sequences that, like database sequences,
//! are not returned on rollback.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use reel_types::{
    Genre, ImportAttempt, ImportId, ImportStatus, MpaaRating, NewImportAttempt, NewPerson,
    NewRecord, Person, PersonId, Record, RecordId,
};
use tokio::sync::Mutex;

use crate::query::{RecordFilters, RecordQuery, SortDirection, SortField, contains_ignore_case};
use crate::store::{
    CatalogStore, CatalogTx, ImportOutcome, PersonKey, RecordKey, StoreError,
};

const PERSON_KEY: &str = "persons_name_birthday_key";
const RECORD_KEY: &str = "records_name_operator_director_key";

/// Committed (or snapshot) contents of the store.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    persons: BTreeMap<PersonId, Person>,
    records: BTreeMap<RecordId, Record>,
    imports: BTreeMap<ImportId, ImportAttempt>,
}

/// One logged write.
#[derive(Debug, Clone)]
enum Op {
    PutPerson(Person),
    RemovePerson(PersonId),
    PutRecord(Record),
    RemoveRecord(RecordId),
    PutImport(ImportAttempt),
}

impl MemoryState {
    fn apply(&mut self, op: &Op) -> Result<(), StoreError> {
        match op {
            Op::PutPerson(person) => {
                let clash = self.persons.values().any(|p| {
                    p.id != person.id && p.name == person.name && p.birthday == person.birthday
                });
                if clash {
                    return Err(StoreError::UniqueViolation(PERSON_KEY.to_owned()));
                }
                self.persons.insert(person.id, person.clone());
            }
            Op::RemovePerson(id) => {
                if let Some(record) = self.records.values().find(|r| references(r, *id)) {
                    return Err(StoreError::ForeignKeyViolation(format!(
                        "person {id} is referenced by record {}",
                        record.id
                    )));
                }
                self.persons.remove(id);
            }
            Op::PutRecord(record) => {
                let people = [
                    Some(record.operator_id),
                    record.director_id,
                    record.screenwriter_id,
                ];
                if let Some(missing) = people
                    .into_iter()
                    .flatten()
                    .find(|id| !self.persons.contains_key(id))
                {
                    return Err(StoreError::ForeignKeyViolation(format!(
                        "person {missing} does not exist"
                    )));
                }
                let clash = self.records.values().any(|r| {
                    r.id != record.id
                        && r.name == record.name
                        && r.operator_id == record.operator_id
                        && r.director_id == record.director_id
                });
                if clash {
                    return Err(StoreError::UniqueViolation(RECORD_KEY.to_owned()));
                }
                self.records.insert(record.id, record.clone());
            }
            Op::RemoveRecord(id) => {
                self.records.remove(id);
            }
            Op::PutImport(attempt) => {
                self.imports.insert(attempt.id, attempt.clone());
            }
        }
        Ok(())
    }
}

fn references(record: &Record, person: PersonId) -> bool {
    record.operator_id == person
        || record.director_id == Some(person)
        || record.screenwriter_id == Some(person)
}

#[derive(Debug, Default)]
struct Committed {
    state: MemoryState,
    /// Remaining successful commits before injected failures start.
    commit_budget: Option<usize>,
    /// Successful commits before a single injected failure.
    failure_after: Option<usize>,
}

#[derive(Debug)]
struct Shared {
    committed: Mutex<Committed>,
    person_seq: AtomicI64,
    record_seq: AtomicI64,
    import_seq: AtomicI64,
}

/// Snapshot-isolated in-memory catalog store.
///
/// Cloning is cheap and every clone sees the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                committed: Mutex::new(Committed::default()),
                person_seq: AtomicI64::new(1),
                record_seq: AtomicI64::new(1),
                import_seq: AtomicI64::new(1),
            }),
        }
    }

    /// Let the next `successful` commits through, then fail every commit
    /// with a backend error until [`clear_commit_failures`] is called.
    ///
    /// [`clear_commit_failures`]: Self::clear_commit_failures
    pub async fn fail_commits_after(&self, successful: usize) {
        self.shared.committed.lock().await.commit_budget = Some(successful);
    }

    /// Let the next `successful` commits through, fail the one after with a
    /// backend error, then commit normally again.
    pub async fn fail_one_commit_after(&self, successful: usize) {
        self.shared.committed.lock().await.failure_after = Some(successful);
    }

    /// Stop injecting commit failures.
    pub async fn clear_commit_failures(&self) {
        let mut committed = self.shared.committed.lock().await;
        committed.commit_budget = None;
        committed.failure_after = None;
    }

    /// Number of committed persons.
    pub async fn person_count(&self) -> usize {
        self.shared.committed.lock().await.state.persons.len()
    }

    /// Number of committed records.
    pub async fn record_count(&self) -> usize {
        self.shared.committed.lock().await.state.records.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let view = self.shared.committed.lock().await.state.clone();
        Ok(MemoryTx {
            shared: Arc::clone(&self.shared),
            view,
            log: Vec::new(),
        })
    }
}

/// A transaction over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    shared: Arc<Shared>,
    view: MemoryState,
    log: Vec<Op>,
}

impl MemoryTx {
    fn write(&mut self, op: Op) -> Result<(), StoreError> {
        self.view.apply(&op)?;
        self.log.push(op);
        Ok(())
    }

    fn person_name(&self, id: Option<PersonId>) -> Option<&str> {
        id.and_then(|id| self.view.persons.get(&id))
            .map(|p| p.name.as_str())
    }

    fn matches(&self, record: &Record, filters: &RecordFilters) -> bool {
        let person_matches = |id: Option<PersonId>, needle: Option<&String>| {
            needle.is_none_or(|n| {
                self.person_name(id)
                    .is_some_and(|name| contains_ignore_case(name, n))
            })
        };

        filters
            .name
            .as_ref()
            .is_none_or(|n| contains_ignore_case(&record.name, n))
            && filters
                .genre
                .as_ref()
                .is_none_or(|n| contains_ignore_case(record.genre.as_str(), n))
            && filters
                .mpaa
                .as_ref()
                .is_none_or(|n| contains_ignore_case(record.mpaa_rating.as_str(), n))
            && person_matches(Some(record.operator_id), filters.operator.as_ref())
            && person_matches(record.director_id, filters.director.as_ref())
            && person_matches(record.screenwriter_id, filters.screenwriter.as_ref())
    }
}

fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, AtomicOrdering::SeqCst)
}

/// Absent values sort after present ones, as in `PostgreSQL`.
fn cmp_nulls_last<T: Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(y),
    }
}

fn cmp_by(field: SortField, a: &Record, b: &Record) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.cmp(&b.name),
        SortField::CreationDate => a.creation_date.cmp(&b.creation_date),
        SortField::OscarsCount => a.oscars_count.cmp(&b.oscars_count),
        SortField::Budget => a.budget.total_cmp(&b.budget),
        SortField::TotalBoxOffice => {
            cmp_nulls_last(a.total_box_office.as_ref(), b.total_box_office.as_ref())
        }
        SortField::Length => cmp_nulls_last(a.length.as_ref(), b.length.as_ref()),
        SortField::GoldenPalmCount => a.golden_palm_count.cmp(&b.golden_palm_count),
        SortField::MpaaRating => a.mpaa_rating.as_str().cmp(b.mpaa_rating.as_str()),
        SortField::Genre => a.genre.as_str().cmp(b.genre.as_str()),
    }
}

fn clamp_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl CatalogTx for MemoryTx {
    async fn insert_person(&mut self, person: &NewPerson) -> Result<Person, StoreError> {
        let id = PersonId(next_id(&self.shared.person_seq));
        let stored = person.clone().with_id(id);
        self.write(Op::PutPerson(stored.clone()))?;
        Ok(stored)
    }

    async fn update_person(
        &mut self,
        id: PersonId,
        person: &NewPerson,
    ) -> Result<Option<Person>, StoreError> {
        if !self.view.persons.contains_key(&id) {
            return Ok(None);
        }
        let stored = person.clone().with_id(id);
        self.write(Op::PutPerson(stored.clone()))?;
        Ok(Some(stored))
    }

    async fn delete_person(&mut self, id: PersonId) -> Result<bool, StoreError> {
        if !self.view.persons.contains_key(&id) {
            return Ok(false);
        }
        self.write(Op::RemovePerson(id))?;
        Ok(true)
    }

    async fn get_person(&mut self, id: PersonId) -> Result<Option<Person>, StoreError> {
        Ok(self.view.persons.get(&id).cloned())
    }

    async fn list_persons(&mut self) -> Result<Vec<Person>, StoreError> {
        Ok(self.view.persons.values().cloned().collect())
    }

    async fn person_exists(&mut self, key: &PersonKey<'_>) -> Result<bool, StoreError> {
        Ok(self.view.persons.values().any(|p| {
            Some(p.id) != key.exclude && p.name == key.name && p.birthday == key.birthday
        }))
    }

    async fn insert_record(&mut self, record: &NewRecord) -> Result<Record, StoreError> {
        let id = RecordId(next_id(&self.shared.record_seq));
        let stored = record.clone().with_id(id);
        self.write(Op::PutRecord(stored.clone()))?;
        Ok(stored)
    }

    async fn update_record(
        &mut self,
        id: RecordId,
        record: &NewRecord,
    ) -> Result<Option<Record>, StoreError> {
        if !self.view.records.contains_key(&id) {
            return Ok(None);
        }
        let stored = record.clone().with_id(id);
        self.write(Op::PutRecord(stored.clone()))?;
        Ok(Some(stored))
    }

    async fn delete_record(&mut self, id: RecordId) -> Result<bool, StoreError> {
        if !self.view.records.contains_key(&id) {
            return Ok(false);
        }
        self.write(Op::RemoveRecord(id))?;
        Ok(true)
    }

    async fn get_record(&mut self, id: RecordId) -> Result<Option<Record>, StoreError> {
        Ok(self.view.records.get(&id).cloned())
    }

    async fn record_exists(&mut self, key: &RecordKey<'_>) -> Result<bool, StoreError> {
        Ok(self.view.records.values().any(|r| {
            Some(r.id) != key.exclude
                && r.name == key.name
                && r.operator_id == key.operator_id
                && r.director_id == key.director_id
        }))
    }

    async fn query_records(&mut self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        let mut rows: Vec<&Record> = self
            .view
            .records
            .values()
            .filter(|r| self.matches(r, &query.filters))
            .collect();

        rows.sort_by(|a, b| {
            let primary = cmp_by(query.sort, a, b);
            let primary = match query.direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        let (skip, take) = query.window.map_or((0, usize::MAX), |w| {
            (clamp_usize(w.offset), clamp_usize(w.limit))
        });

        Ok(rows.into_iter().skip(skip).take(take).cloned().collect())
    }

    async fn count_records_by_rating(&mut self) -> Result<Vec<(MpaaRating, i64)>, StoreError> {
        let mut counts: BTreeMap<MpaaRating, i64> = BTreeMap::new();
        for record in self.view.records.values() {
            let slot = counts.entry(record.mpaa_rating).or_insert(0);
            *slot = slot.saturating_add(1);
        }
        Ok(counts.into_iter().collect())
    }

    async fn count_records_genre_above(&mut self, genre: Genre) -> Result<i64, StoreError> {
        let count = self
            .view
            .records
            .values()
            .filter(|r| r.genre.as_str() > genre.as_str())
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn records_genre_below(&mut self, genre: Genre) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .view
            .records
            .values()
            .filter(|r| r.genre.as_str() < genre.as_str())
            .cloned()
            .collect())
    }

    async fn insert_import(
        &mut self,
        attempt: &NewImportAttempt,
    ) -> Result<ImportAttempt, StoreError> {
        let stored = ImportAttempt {
            id: ImportId(next_id(&self.shared.import_seq)),
            username: attempt.username.clone(),
            import_date: attempt.import_date,
            status: ImportStatus::InProgress,
            objects_count: None,
            file_name: attempt.file_name.clone(),
            error_message: None,
        };
        self.write(Op::PutImport(stored.clone()))?;
        Ok(stored)
    }

    async fn finish_import(
        &mut self,
        id: ImportId,
        outcome: &ImportOutcome,
    ) -> Result<bool, StoreError> {
        let Some(current) = self.view.imports.get(&id) else {
            return Ok(false);
        };
        if current.status.is_terminal() {
            return Ok(false);
        }
        let updated = ImportAttempt {
            status: outcome.status,
            objects_count: Some(outcome.objects_count),
            error_message: outcome.error_message.clone(),
            import_date: outcome.import_date.unwrap_or(current.import_date),
            ..current.clone()
        };
        self.write(Op::PutImport(updated))?;
        Ok(true)
    }

    async fn get_import(&mut self, id: ImportId) -> Result<Option<ImportAttempt>, StoreError> {
        Ok(self.view.imports.get(&id).cloned())
    }

    async fn list_imports(
        &mut self,
        username: Option<&str>,
    ) -> Result<Vec<ImportAttempt>, StoreError> {
        let mut rows: Vec<ImportAttempt> = self
            .view
            .imports
            .values()
            .filter(|a| username.is_none_or(|u| a.username == u))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.import_date
                .cmp(&a.import_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut committed = self.shared.committed.lock().await;

        match committed.commit_budget {
            Some(0) => {
                return Err(StoreError::Backend(String::from("injected commit failure")));
            }
            Some(remaining) => committed.commit_budget = Some(remaining.saturating_sub(1)),
            None => {}
        }
        match committed.failure_after {
            Some(0) => {
                committed.failure_after = None;
                return Err(StoreError::Backend(String::from("injected commit failure")));
            }
            Some(remaining) => committed.failure_after = Some(remaining.saturating_sub(1)),
            None => {}
        }

        let mut next = committed.state.clone();
        for op in &self.log {
            next.apply(op)?;
        }
        committed.state = next;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use reel_types::{Color, Coordinates, Location};

    use super::*;

    fn person(name: &str) -> NewPerson {
        NewPerson {
            name: name.to_owned(),
            eye_color: None,
            hair_color: Color::Red,
            location: Location {
                x: 0,
                y: 0.0,
                z: 0.0,
            },
            birthday: None,
            nationality: None,
        }
    }

    fn record(name: &str, operator_id: PersonId) -> NewRecord {
        NewRecord {
            name: name.to_owned(),
            creation_date: chrono::Utc::now(),
            coordinates: Coordinates { x: 0, y: 0 },
            oscars_count: 1,
            budget: 1.0,
            total_box_office: None,
            length: None,
            golden_palm_count: 1,
            mpaa_rating: MpaaRating::G,
            genre: Genre::Action,
            operator_id,
            director_id: None,
            screenwriter_id: None,
        }
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_person(&person("A")).await.unwrap();
        assert_eq!(store.person_count().await, 0);

        tx.rollback().await.unwrap();
        assert_eq!(store.person_count().await, 0);
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let p = tx.insert_person(&person("A")).await.unwrap();
        tx.insert_record(&record("Heat", p.id)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.person_count().await, 1);
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_person_in_one_tx_violates_constraint() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_person(&person("A")).await.unwrap();
        let err = tx.insert_person(&person("A")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn racing_commits_hit_the_constraint() {
        let store = MemoryStore::new();
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        first.insert_person(&person("A")).await.unwrap();
        second.insert_person(&person("A")).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.person_count().await, 1);
    }

    #[tokio::test]
    async fn record_requires_existing_operator() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx.insert_record(&record("Heat", PersonId(99))).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn referenced_person_cannot_be_deleted() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let p = tx.insert_person(&person("A")).await.unwrap();
        tx.insert_record(&record("Heat", p.id)).await.unwrap();
        let err = tx.delete_person(p.id).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn injected_commit_failure() {
        let store = MemoryStore::new();
        store.fail_commits_after(1).await;

        store.begin().await.unwrap().commit().await.unwrap();
        let err = store.begin().await.unwrap().commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        store.clear_commit_failures().await;
        store.begin().await.unwrap().commit().await.unwrap();
    }

    #[tokio::test]
    async fn one_shot_commit_failure() {
        let store = MemoryStore::new();
        store.fail_one_commit_after(1).await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_person(&person("A")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_person(&person("B")).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.person_count().await, 1);

        store.begin().await.unwrap().commit().await.unwrap();
    }

    #[tokio::test]
    async fn terminal_import_is_not_overwritten() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let attempt = tx
            .insert_import(&NewImportAttempt {
                username: String::from("alice"),
                import_date: chrono::Utc::now(),
                file_name: None,
            })
            .await
            .unwrap();
        let success = ImportOutcome {
            status: ImportStatus::Success,
            objects_count: 2,
            error_message: None,
            import_date: None,
        };
        assert!(tx.finish_import(attempt.id, &success).await.unwrap());

        let failure = ImportOutcome {
            status: ImportStatus::Failed,
            objects_count: 0,
            error_message: Some(String::from("late")),
            import_date: None,
        };
        assert!(!tx.finish_import(attempt.id, &failure).await.unwrap());

        let row = tx.get_import(attempt.id).await.unwrap().unwrap();
        assert_eq!(row.status, ImportStatus::Success);
        assert_eq!(row.objects_count, Some(2));
    }

    #[tokio::test]
    async fn absent_values_sort_last_ascending() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let p = tx.insert_person(&person("A")).await.unwrap();
        let short = tx
            .insert_record(&NewRecord {
                length: Some(90),
                ..record("Short", p.id)
            })
            .await
            .unwrap();
        let unknown = tx.insert_record(&record("Unknown", p.id)).await.unwrap();

        let query = RecordQuery {
            sort: SortField::Length,
            direction: SortDirection::Asc,
            ..RecordQuery::default()
        };
        let ids: Vec<RecordId> = tx
            .query_records(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![short.id, unknown.id]);
    }
}
