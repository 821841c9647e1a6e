#![allow(dead_code)]

async fn test_find_chat(pool: sqlx::PgPool) {
    use crate::modules::chat::repository::ChatRepository;
    use crate::modules::chat::repository_pg::ChatRepositoryPg;
    use uuid::Uuid;

    let repo = ChatRepositoryPg::new(pool);

    let id = Uuid::parse_str("0192b1c4-5f6a-7b8c-9d0e-1f2a3b4c5d6e").unwrap();

    let result = repo.find_by_id(&id).await.unwrap();

    println!("{:#?}", result);

    assert!(result.is_some());
}
