/// Integration tests for the domain layer, configuration and file-backed storage

#[cfg(test)]
mod tests {
    use cms_persistence::application::cache::{CacheKeys, CacheRetrievalPolicy};
    use cms_persistence::application::repositories::{
        ContentTypeRepository, EntityContainerRepository,
    };
    use cms_persistence::config::PersistenceConfig;
    use cms_persistence::domain::*;
    use cms_persistence::infrastructure::persistence::{
        ContentTypeCompositionRepository, SqliteNodeStore,
    };
    use std::cmp::Ordering;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_duplicate_names_sort_like_a_tree_view() {
        let mut names = vec![
            "Page (10)",
            "banana",
            "Page (2)",
            "Apple",
            "Page (1)",
            "Page",
        ];
        sort_similar_names(&mut names);
        assert_eq!(
            names,
            vec!["Apple", "banana", "Page", "Page (1)", "Page (2)", "Page (10)"]
        );
    }

    #[test]
    fn test_zero_suffix_is_not_numeric() {
        // "Page (0)" is compared as a plain string, so it lands before "Page (1)"
        // only because '0' < '1', not because 0 < 1
        assert_eq!(compare_similar_names("Page (0)", "Page (1)"), Ordering::Less);
        assert_eq!(compare_similar_names("Page (0)", "Page (10)"), Ordering::Less);
        assert_eq!(compare_similar_names("Page (20)", "Page (3)"), Ordering::Greater);
    }

    #[test]
    fn test_container_partitions() {
        assert_eq!(
            ObjectType::DOCUMENT_TYPE.container_type(),
            Some(ObjectType::DOCUMENT_TYPE_CONTAINER)
        );
        assert_eq!(
            ObjectType::MEDIA_TYPE_CONTAINER.contained_type(),
            Some(ObjectType::MEDIA_TYPE)
        );
        assert_eq!(ObjectType::MEMBER_TYPE.container_type(), None);
        assert!(EntityContainer::new(ObjectType::MEMBER_TYPE, "Members", NodeId::ROOT).is_err());
    }

    #[test]
    fn test_composition_editing() {
        let now = chrono::Utc::now();
        let mut page = ContentTypeComposition::restore(
            NodeId::new(5),
            uuid::Uuid::new_v4(),
            Alias::new("page").unwrap(),
            "Page".to_string(),
            NodeId::ROOT,
            Default::default(),
            false,
            now,
            now,
        );

        assert!(page.add_composition(NodeId::new(7)).unwrap());
        assert!(!page.add_composition(NodeId::new(7)).unwrap());
        assert!(page.composes(NodeId::new(7)));
        assert_eq!(
            page.add_composition(NodeId::new(5)),
            Err(DomainError::CyclicComposition {
                type_id: NodeId::new(5),
                composed: NodeId::new(5),
            })
        );
        assert!(page.remove_composition(NodeId::new(7)));
        assert!(!page.composes(NodeId::new(7)));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "cache": {{ "mediaTypes": {{ "cacheThreshold": 10 }} }} }}"#
        )
        .unwrap();

        let config = PersistenceConfig::load(file.path()).unwrap();
        assert_eq!(config.cache.media_types.cache_threshold, 10);
        assert_eq!(config.cache.document_types, CacheRetrievalPolicy::default());
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cms.db");

        let (page_id, folder_id) = {
            let store = Arc::new(SqliteNodeStore::new_with_path(&path).unwrap());
            let mut documents: ContentTypeCompositionRepository<DocumentType, _> =
                ContentTypeCompositionRepository::with_policies(
                    store,
                    Arc::new(CacheKeys::new()),
                    CacheRetrievalPolicy::default(),
                    CacheRetrievalPolicy::default(),
                )
                .unwrap();

            let mut folder =
                EntityContainer::new(ObjectType::DOCUMENT_TYPE, "Pages", NodeId::ROOT).unwrap();
            documents.containers_mut().unwrap().save(&mut folder).unwrap();

            let mut page = DocumentType::new(Alias::new("page").unwrap(), "Page");
            page.set_default_template_id(Some(NodeId::new(1051)));
            documents.save(&mut page).unwrap();
            documents.move_to(&mut page, Some(&folder)).unwrap();

            (*page.id(), *folder.id())
        };

        let store = Arc::new(SqliteNodeStore::new_with_path(&path).unwrap());
        let documents: ContentTypeCompositionRepository<DocumentType, _> =
            ContentTypeCompositionRepository::with_policies(
                store,
                Arc::new(CacheKeys::new()),
                CacheRetrievalPolicy::default(),
                CacheRetrievalPolicy::default(),
            )
            .unwrap();

        let page = documents.get(page_id).unwrap().unwrap();
        assert_eq!(page.parent_id(), folder_id);
        assert_eq!(page.default_template_id(), Some(NodeId::new(1051)));
        assert_eq!(
            documents.containers().unwrap().get(folder_id).unwrap().unwrap().name(),
            "Pages"
        );
        assert_eq!(
            documents.path_of(page_id).unwrap().to_string(),
            format!("-1,{},{}", folder_id, page_id)
        );
    }
}
