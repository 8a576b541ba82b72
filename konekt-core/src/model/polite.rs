use crate::model::PeerId;

/// Role in the perfect-negotiation protocol. The polite peer yields on
/// a simultaneous-offer collision; the impolite peer expects its own
/// offer to win. Both ends of a room must derive the same assignment
/// from the membership alone, or glare resolution falls apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoliteRole {
    Polite,
    Impolite,
}

impl PoliteRole {
    /// The lexicographically larger peer id is polite.
    pub fn for_pair(local: &PeerId, remote: &PeerId) -> Self {
        if local > remote {
            PoliteRole::Polite
        } else {
            PoliteRole::Impolite
        }
    }

    pub fn is_polite(self) -> bool {
        matches!(self, PoliteRole::Polite)
    }
}
