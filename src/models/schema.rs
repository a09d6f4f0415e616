diesel::table! {
    accounts (account_id) {
        account_id -> Text,
        email -> Text,
        password -> Text,
        salt -> Bytea,
        is_verified -> Bool,
        email_token -> Nullable<Text>,
        created_at -> Nullable<Timestamp>,
        updated_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    profiles (profile_id) {
        profile_id -> Text,
        account_id -> Text,
        full_name -> Text,
    }
}

diesel::table! {
    posts (post_id) {
        post_id -> Text,
        content -> Text,
        image_url -> Nullable<Text>,
        date -> Timestamp,
        last_updated -> Timestamp,
        account_id -> Text,
    }
}

diesel::table! {
    images (image_id) {
        image_id -> Text,
        image_url -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(accounts, profiles, posts, images);
