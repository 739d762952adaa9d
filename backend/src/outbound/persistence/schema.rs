//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. The
//! `diesel print-schema` command regenerates them from a live database.

diesel::table! {
    /// Registered accounts. `email` is stored lower-cased and unique.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        username -> Varchar,
        password_hash -> Varchar,
        avatar_url -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Shared lists; the owner is also recorded in `list_members`.
    lists (id) {
        id -> Uuid,
        name -> Varchar,
        owner_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    list_members (list_id, user_id) {
        list_id -> Uuid,
        user_id -> Uuid,
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// List items. A check constraint ties `claimed` to `claimed_by`.
    items (id) {
        id -> Uuid,
        list_id -> Uuid,
        name -> Varchar,
        claimed -> Bool,
        claimed_by -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Digests of issued recovery codes.
    one_time_codes (id) {
        id -> Int8,
        email -> Varchar,
        code_digest -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(list_members -> lists (list_id));
diesel::joinable!(items -> lists (list_id));
diesel::joinable!(lists -> users (owner_id));

diesel::allow_tables_to_appear_in_same_query!(users, lists, list_members, items, one_time_codes,);
