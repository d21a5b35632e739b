//! Prints resources embedded by two independent targets.

mod target1 {
    resembed::include_target!("target1");
}

mod target2 {
    resembed::include_target!("target2");
}

/// Whether target2 carries its extra notes file, decided at compile time.
const TARGET2_HAS_NOTES: bool = target2::has!("resources/notes.txt");

fn main() {
    println!();
    println!("[main.rs] This is: resources/message.txt from target1");
    println!("{}", target1::embed!("resources/message.txt"));

    println!();
    println!("[main.rs] This is: resources/FirstFolder/config.json from target1");
    println!("{}", target1::embed!("resources/FirstFolder/config.json"));

    println!();
    println!("[main.rs] This is: resources/message.txt from target2");
    println!("{}", target2::embed!("resources/message.txt"));

    if TARGET2_HAS_NOTES {
        println!();
        println!("[main.rs] This is: resources/notes.txt from target2");
        print!("{}", target2::embed!("resources/notes.txt"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn target1_message() {
        let blob = target1::embed!("resources/message.txt");
        assert_eq!(blob.as_slice(), Some(&b"hello world"[..]));
        assert_eq!(blob.len(), 11);
        assert_eq!(blob.as_str(), Some("hello world"));
        assert_eq!(blob.path(), "resources/message.txt");
    }

    #[test]
    fn target1_config() {
        let blob = target1::embed!("resources/FirstFolder/config.json");
        assert_eq!(&*blob.bytes(), br#"{"a":1}"#);
        assert_eq!(blob.len(), 7);
    }

    #[test]
    fn targets_are_isolated() {
        let one = target1::embed!("resources/message.txt");
        let two = target2::embed!("resources/message.txt");
        assert_eq!(one.path(), two.path());
        assert_eq!(two.as_str(), Some("hello from target2"));
        assert_ne!(one.fingerprint(), two.fingerprint());
        assert!(!std::ptr::eq(one, two));
    }

    #[test]
    fn repeated_lookups_observe_the_same_data() {
        let a = target1::embed!("resources/message.txt");
        let b = target1::embed!("resources/message.txt");
        assert!(std::ptr::eq(a, b));
        assert!(std::ptr::eq(a, &target1::RESOURCES_MESSAGE_TXT));
    }

    #[test]
    fn any_spelling_of_a_present_path_resolves() {
        let raw = target1::embed!(r"resources/message.txt");
        let escaped = target1::embed!("resources/m\x65ssage.txt");
        assert!(std::ptr::eq(raw, &target1::RESOURCES_MESSAGE_TXT));
        assert!(std::ptr::eq(escaped, &target1::RESOURCES_MESSAGE_TXT));
        assert_eq!(
            target2::embed!(r#"resources/FirstFolder/config.json"#).as_str(),
            Some(r#"{"a":2,"target":"target2"}"#)
        );

        const RAW_HAS_NOTES: bool = target2::has!(r"resources/notes.txt");
        const RAW_T1_HAS_NOTES: bool = target1::has!(r"resources/notes.txt");
        assert!(RAW_HAS_NOTES);
        assert!(!RAW_T1_HAS_NOTES);
    }

    #[test]
    fn presence_is_known_at_compile_time() {
        const T1_HAS_NOTES: bool = target1::has!("resources/notes.txt");
        const T1_HAS_MESSAGE: bool = target1::has!("resources/message.txt");
        assert!(TARGET2_HAS_NOTES);
        assert!(!T1_HAS_NOTES);
        assert!(T1_HAS_MESSAGE);
    }

    #[test]
    fn manifests_list_paths_in_order() {
        assert_eq!(target1::MANIFEST.target(), "target1");
        let paths: Vec<_> = target1::MANIFEST.paths().collect();
        assert_eq!(
            paths,
            ["resources/FirstFolder/config.json", "resources/message.txt"]
        );
        assert_eq!(target2::MANIFEST.len(), 3);
    }

    #[test]
    fn runtime_find_matches_static_lookup() {
        let found = target2::MANIFEST.find("resources/notes.txt").unwrap();
        assert!(std::ptr::eq(found, target2::embed!("resources/notes.txt")));
        assert!(target1::MANIFEST.find("resources/notes.txt").is_none());
    }

    #[test]
    fn reader_yields_the_file() {
        let mut text = String::new();
        target2::embed!("resources/FirstFolder/config.json")
            .reader()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, r#"{"a":2,"target":"target2"}"#);
    }
}
