// Diesel table definitions matching migrations/.

diesel::table! {
    projects (id) {
        id -> Text,
        workflow_state -> Text,
    }
}

diesel::table! {
    episodes (project_id, order_no) {
        project_id -> Text,
        order_no -> Int4,
        title -> Text,
        summary -> Text,
        outline -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    scenes (id) {
        id -> Text,
        project_id -> Text,
        shot_prompt -> Nullable<Text>,
    }
}

diesel::table! {
    artifacts (kind, owner_id) {
        kind -> Text,
        owner_id -> Text,
        value -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(episodes -> projects (project_id));
diesel::joinable!(scenes -> projects (project_id));

diesel::allow_tables_to_appear_in_same_query!(projects, episodes, scenes, artifacts);
