diesel::table! {
    scans (id) {
        id -> Integer,
        full_name -> Text,
        age -> BigInt,
        gender -> Text,
        contact -> Nullable<Text>,
        scanned_at -> Text,
        result_json -> Text,
        primary_class -> Nullable<Text>,
    }
}
