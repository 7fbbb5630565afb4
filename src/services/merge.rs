use crate::core::state::{
    is_placeholder_age, is_placeholder_text, CharacterProfile, Role, SuggestedActor,
};

/// Folds a freshly analysed profile into the one already on record.
///
/// Sets are unioned, `Lead` is sticky, scalar attributes keep the first real
/// value seen, and the identity (`id`, `name`) of the first sighting is kept.
pub fn merge(existing: Option<CharacterProfile>, incoming: CharacterProfile) -> CharacterProfile {
    let Some(mut merged) = existing else {
        return incoming;
    };

    merged.scenes.extend(incoming.scenes);
    merged.personality.extend(incoming.personality);

    if incoming.role == Role::Lead {
        merged.role = Role::Lead;
    }

    if is_placeholder_age(merged.age) {
        merged.age = incoming.age;
    }
    keep_first_text(&mut merged.race, incoming.race);
    keep_first_text(&mut merged.gender, incoming.gender);
    keep_first_text(&mut merged.description, incoming.description);

    merged.suggested_actor = pick_suggestion(merged.suggested_actor, incoming.suggested_actor);
    merged
}

fn keep_first_text(current: &mut String, incoming: String) {
    if is_placeholder_text(current) {
        *current = incoming;
    }
}

// Equal match counts go to the incoming candidate.
fn pick_suggestion(
    existing: Option<SuggestedActor>,
    incoming: Option<SuggestedActor>,
) -> Option<SuggestedActor> {
    match (existing, incoming) {
        (Some(existing), Some(incoming)) => {
            if existing.match_count > incoming.match_count {
                Some(existing)
            } else {
                Some(incoming)
            }
        }
        (existing, None) => existing,
        (None, incoming) => incoming,
    }
}
