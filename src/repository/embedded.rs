refinery::embed_migrations!("./migrations/postgres");
