use std::fmt;

/// Negotiation state of one remote participant.
///
/// ```text
/// New -> OfferSent  -> Connected
/// New -> AnswerSent -> Connected
/// any -> Disconnected (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerState {
    New,
    OfferSent,
    AnswerSent,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid peer state transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: PeerState,
    pub to: PeerState,
}

impl PeerState {
    pub fn can_transition_to(self, next: PeerState) -> bool {
        use PeerState::*;
        matches!(
            (self, next),
            (New, OfferSent)
                | (New, AnswerSent)
                | (OfferSent, Connected)
                | (AnswerSent, Connected)
                | (New | OfferSent | AnswerSent | Connected, Disconnected)
        )
    }

    pub fn transition(self, next: PeerState) -> Result<PeerState, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_negotiating(self) -> bool {
        matches!(self, PeerState::OfferSent | PeerState::AnswerSent)
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PeerState::New => "new",
            PeerState::OfferSent => "offer-sent",
            PeerState::AnswerSent => "answer-sent",
            PeerState::Connected => "connected",
            PeerState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}
