mod helper;
mod invalid_json;
