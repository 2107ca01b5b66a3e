//! Element properties

pub mod scalar;
pub mod section;
pub mod shell;

pub use scalar::{Pdamp, Pdamp5, Pdampt, Pelas, Pmass, Pvisc};
pub use section::{Pbar, Prod, Pshear, Psolid, Ptube};
pub use shell::{Pcomp, Ply, Pshell};

use crate::entity::{BulkEntry, RefTarget, Reference};
use crate::error::Result;
use crate::field::Field;
use crate::generic::GenericCard;
use serde::{Deserialize, Serialize};

/// An element property of any supported kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    Pelas(Pelas),
    Pdamp(Pdamp),
    Pdamp5(Pdamp5),
    Pdampt(Pdampt),
    Pvisc(Pvisc),
    Prod(Prod),
    Ptube(Ptube),
    Pbar(Pbar),
    Pshear(Pshear),
    Pshell(Pshell),
    Pcomp(Pcomp),
    Psolid(Psolid),
    /// Properties kept by identity only (PGAP, PBEAM, PBUSH)
    Other(GenericCard),
}

impl Property {
    fn entry(&self) -> &dyn BulkEntry {
        match self {
            Property::Pelas(p) => p,
            Property::Pdamp(p) => p,
            Property::Pdamp5(p) => p,
            Property::Pdampt(p) => p,
            Property::Pvisc(p) => p,
            Property::Prod(p) => p,
            Property::Ptube(p) => p,
            Property::Pbar(p) => p,
            Property::Pshear(p) => p,
            Property::Pshell(p) => p,
            Property::Pcomp(p) => p,
            Property::Psolid(p) => p,
            Property::Other(p) => p,
        }
    }

    /// Property ID
    pub fn pid(&self) -> i32 {
        self.entry().id()
    }

    /// Materials the property uses, each once
    pub fn material_ids(&self) -> Vec<i32> {
        match self {
            Property::Pshell(p) => p.material_ids(),
            Property::Pcomp(p) => p.material_ids(),
            other => other
                .references()
                .into_iter()
                .filter(|r| r.target == RefTarget::Material)
                .map(|r| r.id)
                .collect(),
        }
    }
}

impl BulkEntry for Property {
    fn card_type(&self) -> &str {
        self.entry().card_type()
    }

    fn id(&self) -> i32 {
        self.entry().id()
    }

    fn comment(&self) -> &str {
        self.entry().comment()
    }

    fn raw_fields(&self) -> Vec<Field> {
        self.entry().raw_fields()
    }

    fn references(&self) -> Vec<Reference> {
        self.entry().references()
    }

    fn verify(&self) -> Result<()> {
        self.entry().verify()
    }
}
