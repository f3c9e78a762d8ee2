//! Agrupamento familiar: quem pertence a qual família e se a família
//! prefere servir junta (padrão: sim). Estrutura carregada uma vez por
//! geração e tratada como somente leitura.

use std::collections::HashMap;

use crate::model::{FamilyGroup, FamilyId, Minister, MinisterId};

#[derive(Debug, Clone, Default)]
pub struct FamilyDirectory {
    members: HashMap<FamilyId, Vec<MinisterId>>,
    prefer_together: HashMap<FamilyId, bool>,
}

impl FamilyDirectory {
    pub fn from_roster(ministers: &[Minister], families: &[FamilyGroup]) -> Self {
        let mut members: HashMap<FamilyId, Vec<MinisterId>> = HashMap::new();
        for minister in ministers {
            if let Some(family_id) = &minister.family_id {
                members
                    .entry(family_id.clone())
                    .or_default()
                    .push(minister.id.clone());
            }
        }

        let prefer_together = families
            .iter()
            .map(|f| (f.id.clone(), f.prefer_serve_together))
            .collect();

        Self {
            members,
            prefer_together,
        }
    }

    pub fn family_ids(&self) -> impl Iterator<Item = &FamilyId> {
        self.members.keys()
    }

    pub fn members_of(&self, family: &FamilyId) -> &[MinisterId] {
        self.members.get(family).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Preferência de servir juntos; famílias sem registro explícito
    /// preferem juntos.
    pub fn prefers_together(&self, family: &FamilyId) -> bool {
        self.prefer_together.get(family).copied().unwrap_or(true)
    }
}
