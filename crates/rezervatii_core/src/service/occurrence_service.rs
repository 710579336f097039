//! Occurrence entry use case.
//!
//! # Responsibility
//! - Resolve species and reserve by exact (case-insensitive) name.
//! - Apply permission checks before any write.
//!
//! # Invariants
//! - At most one occurrence per (species, reserve, year).
//! - When the caller leaves rarity unset, it is copied from the species.

use crate::access::{AccessError, Action, RecordKind, UserAccount};
use crate::model::links::Occurrence;
use crate::model::RecordId;
use crate::repo::occurrence_repo::OccurrenceRepository;
use crate::repo::reserve_repo::ReserveRepository;
use crate::repo::species_repo::SpeciesRepository;
use crate::repo::{require_id, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Access(AccessError),
    Repo(RepoError),
    /// Required request field is blank.
    MissingField(&'static str),
    UnknownSpecies(String),
    UnknownReserve(String),
    DuplicateOccurrence {
        species: String,
        reserve: String,
        year: i32,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::MissingField(field) => write!(f, "`{field}` is required"),
            Self::UnknownSpecies(name) => write!(f, "species `{name}` does not exist"),
            Self::UnknownReserve(name) => write!(f, "reserve `{name}` does not exist"),
            Self::DuplicateOccurrence {
                species,
                reserve,
                year,
            } => write!(
                f,
                "an occurrence of `{species}` in `{reserve}` is already recorded for {year}"
            ),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Access(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AccessError> for ServiceError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Form-level input for a new occurrence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewOccurrence {
    pub species_name: String,
    pub reserve_name: String,
    pub year: i32,
    /// `None` inherits the species rarity flag.
    pub is_rare: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: Option<String>,
    pub observer: Option<String>,
    pub notes: Option<String>,
}

pub struct OccurrenceService<S, R, O>
where
    S: SpeciesRepository,
    R: ReserveRepository,
    O: OccurrenceRepository,
{
    species: S,
    reserves: R,
    occurrences: O,
}

impl<S, R, O> OccurrenceService<S, R, O>
where
    S: SpeciesRepository,
    R: ReserveRepository,
    O: OccurrenceRepository,
{
    pub fn new(species: S, reserves: R, occurrences: O) -> Self {
        Self {
            species,
            reserves,
            occurrences,
        }
    }

    /// Records `request` on behalf of `account` and returns the new row id.
    pub fn add_occurrence(
        &self,
        account: &UserAccount,
        request: &NewOccurrence,
    ) -> ServiceResult<RecordId> {
        account.authorize(Action::Add, RecordKind::Occurrence)?;

        let species_name = request.species_name.trim();
        if species_name.is_empty() {
            return Err(ServiceError::MissingField("species_name"));
        }
        let reserve_name = request.reserve_name.trim();
        if reserve_name.is_empty() {
            return Err(ServiceError::MissingField("reserve_name"));
        }

        let species = self
            .species
            .find_species_by_name(species_name)?
            .ok_or_else(|| ServiceError::UnknownSpecies(species_name.to_string()))?;
        let reserve = self
            .reserves
            .find_reserve_by_name(reserve_name)?
            .ok_or_else(|| ServiceError::UnknownReserve(reserve_name.to_string()))?;
        let species_id = require_id(species.id, "species")?;
        let reserve_id = require_id(reserve.id, "reserve")?;

        if self
            .occurrences
            .occurrence_exists(species_id, reserve_id, request.year)?
        {
            return Err(ServiceError::DuplicateOccurrence {
                species: species.scientific_name,
                reserve: reserve.name,
                year: request.year,
            });
        }

        let mut occurrence = Occurrence::new(species_id, reserve_id, request.year);
        occurrence.is_rare = request.is_rare.unwrap_or(species.is_rare);
        occurrence.latitude = request.latitude;
        occurrence.longitude = request.longitude;
        occurrence.source = crate::model::clean_optional(request.source.as_deref());
        occurrence.observer = crate::model::clean_optional(request.observer.as_deref());
        occurrence.notes = crate::model::clean_optional(request.notes.as_deref());
        occurrence.created_by = Some(account.username.clone());

        let id = self.occurrences.create_occurrence(&occurrence)?;
        info!(
            "event=occurrence_add module=service status=ok id={id} year={}",
            request.year
        );
        Ok(id)
    }
}
