use crate::core::state::SceneUnit;

/// One unit of enrichment work: analyse a single scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub ordinal: u32,
}

impl Job {
    /// Jobs without a scene id are resolved without calling the service.
    pub fn is_resolvable(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// Builds the job queue in input order. Nothing is deduplicated or dropped.
pub fn build_jobs(scenes: &[SceneUnit]) -> Vec<Job> {
    scenes
        .iter()
        .map(|scene| Job {
            id: scene.id.clone(),
            ordinal: scene.ordinal,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_duplicates_preserved() {
        let scenes = vec![
            SceneUnit::new("s2", 2),
            SceneUnit::new("s1", 1),
            SceneUnit::new("s2", 2),
        ];
        let jobs = build_jobs(&scenes);

        let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["s2", "s1", "s2"]);
        assert_eq!(jobs[1].ordinal, 1);
    }

    #[test]
    fn test_empty_id_is_kept_but_unresolvable() {
        let jobs = build_jobs(&[SceneUnit::new("", 1), SceneUnit::new("  ", 2)]);
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| !j.is_resolvable()));
    }
}
