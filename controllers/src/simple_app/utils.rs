use resources::objects::{Metadata, MANAGED_BY_LABEL, MANAGED_BY_VALUE};

use crate::error::{Error, Result};

/// Refuse to touch a resource that does not carry our managed-by marker,
/// even when its identity matches a specification.
pub fn ensure_managed(metadata: &Metadata, kind: &'static str) -> Result<()> {
    match metadata.labels.get(MANAGED_BY_LABEL) {
        Some(value) if value == MANAGED_BY_VALUE => Ok(()),
        _ => Err(Error::NotManaged {
            kind,
            namespace: metadata.namespace.clone(),
            name: metadata.name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use resources::objects::Labels;

    use super::*;

    fn metadata(labels: Labels) -> Metadata {
        Metadata {
            namespace: "default".to_string(),
            name: "web".to_string(),
            labels,
        }
    }

    #[test]
    fn accepts_our_marker() {
        let mut labels = Labels::new();
        labels.insert(MANAGED_BY_LABEL, MANAGED_BY_VALUE);
        assert!(ensure_managed(&metadata(labels), "Deployment").is_ok());
    }

    #[test]
    fn rejects_missing_marker() {
        let err = ensure_managed(&metadata(Labels::new()), "Deployment").unwrap_err();
        assert!(matches!(err, Error::NotManaged { kind: "Deployment", .. }));
    }

    #[test]
    fn rejects_foreign_marker() {
        let mut labels = Labels::new();
        labels.insert(MANAGED_BY_LABEL, "helm");
        let err = ensure_managed(&metadata(labels), "Service").unwrap_err();
        assert_eq!(
            err.to_string(),
            "found Service default.web not managed by us"
        );
    }
}
