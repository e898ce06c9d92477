use super::channels::{chapter_id, merge_channels, slugify};
use super::machine::LineClass;
use super::*;
use crate::config::SuffixRules;
use crate::model::ChapterMarker;

const PALI: &str = "Majjhimanikāyo
1. Mūlapariyāyavaggo
Paṭhamavaggo
1. Mūlapariyāyasuttaṃ
1. Evaṃ me sutaṃ – ekaṃ samayaṃ bhagavā ukkaṭṭhāyaṃ viharati.
Tatra kho bhagavā bhikkhū āmantesi.
2. Idha, bhikkhave, assutavā puthujjano.
(3) Tatiyasuttaṃ
Tatiya body.
Mūlapariyāyasuttaṃ niṭṭhitaṃ paṭhamaṃ.
4. Sabbāsavasuttaṃ
Evaṃ me sutaṃ.
2. Sīhanādavaggo
11. Cūḷasīhanādasuttaṃ
Evaṃ me sutaṃ.
";

const ENGLISH: &str = "1. The Chapter on the Root
1. The Root of All Things Discourse
1. Thus have I heard.
2. Here, monks, an uneducated ordinary person.
(3) The Third Discourse
4. All the Taints Discourse
Thus have I heard.
9. Stray section.
2. The Chapter on the Lion's Roar
11. The Shorter Lion's Roar Discourse
";

fn classifier() -> LineClassifier {
    let normalizer = TextNormalizer::new(&SuffixRules::default()).expect("normalizer should build");
    LineClassifier::new(&normalizer).expect("classifier should build")
}

fn entry(pali: &str, english: Option<&str>, expected: Option<usize>) -> ChapterEntry {
    ChapterEntry {
        id: None,
        marker: ChapterMarker {
            pali: pali.to_string(),
            english: english.map(str::to_string),
            sinhala: None,
        },
        expected_sections: expected,
    }
}

fn texts() -> BookTexts {
    BookTexts {
        pali: PALI.to_string(),
        english: Some(ENGLISH.to_string()),
        sinhala: None,
    }
}

#[test]
fn block_runs_from_marker_to_next_marker() {
    let block = extract_chapter_block(PALI, "mūlapariyāyavaggo", Some("Sīhanādavaggo"), Language::Pali)
        .expect("block should be found");

    assert_eq!(block.first().copied(), Some("1. Mūlapariyāyavaggo"));
    assert_eq!(block.last().copied(), Some("Evaṃ me sutaṃ."));
    assert_eq!(block.len(), 11);

    let tail = extract_chapter_block(PALI, "Sīhanādavaggo", None, Language::Pali)
        .expect("last block should run to the end");
    assert_eq!(tail.len(), 3);
}

#[test]
fn missing_marker_is_a_typed_error() {
    let error = extract_chapter_block(PALI, "Opammavaggo", None, Language::Sinhala)
        .expect_err("marker is absent");

    assert_eq!(error.kind(), IssueKind::MissingChapterMarker);
    assert!(error.to_string().contains("sinhala"));
}

#[test]
fn marker_must_follow_a_number_period_and_space() {
    let text = "Mūlapariyāyavaggo\n3 . Mūlapariyāyavaggo\n3.5 Mūlapariyāyavaggo\n3. Mūlapariyāyavaggo\nbody";
    let block = extract_chapter_block(text, "Mūlapariyāyavaggo", None, Language::Pali)
        .expect("numbered marker line");
    assert_eq!(block, vec!["3. Mūlapariyāyavaggo", "body"]);

    let error = extract_chapter_block("2.Mūlapariyāyavaggo\nbody", "Mūlapariyāyavaggo", None, Language::Pali)
        .expect_err("no space after the period");
    assert_eq!(error.kind(), IssueKind::MissingChapterMarker);
}

#[test]
fn decimal_and_unspaced_lines_stay_in_the_open_section() {
    let classifier = classifier();

    assert_eq!(
        classifier.classify("2.5 yojanas away from the town."),
        LineClass::Body {
            text: "2.5 yojanas away from the town.",
        }
    );
    assert_eq!(
        classifier.classify("3.Tatra kho"),
        LineClass::Body { text: "3.Tatra kho" }
    );
    assert_eq!(
        classifier.classify("7."),
        LineClass::SectionStart {
            number: 7,
            content: "",
        }
    );

    let lines = [
        "1. Opammavaggo",
        "5. Evaṃ me sutaṃ.",
        "2.5 yojanas away from the town.",
        "3.Tatra kho",
    ];
    let segments = segment_channel(&classifier, &lines);
    let numbers = segments
        .sections
        .iter()
        .map(|section| section.number)
        .collect::<Vec<u32>>();
    assert_eq!(numbers, vec![5]);
    assert_eq!(
        segments.sections[0].body,
        vec![
            "Evaṃ me sutaṃ.".to_string(),
            "2.5 yojanas away from the town.".to_string(),
            "3.Tatra kho".to_string(),
        ]
    );
}

#[test]
fn lines_are_classified_by_shape_and_suffix() {
    let classifier = classifier();

    assert_eq!(classifier.classify("   "), LineClass::Blank);
    assert_eq!(
        classifier.classify("(103) Dutiyasuttaṃ"),
        LineClass::Absorbed {
            number: 103,
            title: "Dutiyasuttaṃ",
        }
    );
    assert_eq!(
        classifier.classify("5–7. Tīṇi suttāni"),
        LineClass::RangeStart {
            start: 5,
            end: 7,
            content: "Tīṇi suttāni",
        }
    );
    assert_eq!(
        classifier.classify("2. Sīhanādavaggo"),
        LineClass::Vagga {
            name: "Sīhanādavaggo",
        }
    );
    assert_eq!(
        classifier.classify("Paṭhamavaggo"),
        LineClass::Vagga {
            name: "Paṭhamavaggo",
        }
    );
    assert_eq!(
        classifier.classify("2. Sabbāsavasuttaṃ"),
        LineClass::TitleHeading {
            number: 2,
            title: "Sabbāsavasuttaṃ",
        }
    );
    assert_eq!(
        classifier.classify("14. Evaṃ me sutaṃ."),
        LineClass::SectionStart {
            number: 14,
            content: "Evaṃ me sutaṃ.",
        }
    );
    assert_eq!(
        classifier.classify("Sabbāsavasuttaṃ niṭṭhitaṃ dutiyaṃ."),
        LineClass::Footer {
            text: "Sabbāsavasuttaṃ niṭṭhitaṃ dutiyaṃ.",
        }
    );
    assert_eq!(
        classifier.classify("(7) ordinary parenthetical remark"),
        LineClass::Body {
            text: "(7) ordinary parenthetical remark",
        }
    );
}

#[test]
fn escaped_joiners_do_not_hide_title_suffixes() {
    let classifier = classifier();

    assert_eq!(
        classifier.classify("1. මූලපරියාය සූත්&zwj;රය"),
        LineClass::TitleHeading {
            number: 1,
            title: "මූලපරියාය සූත්&zwj;රය",
        }
    );
}

#[test]
fn zero_and_inverted_numbers_fall_through() {
    let classifier = classifier();

    assert!(matches!(classifier.classify("0. nothing"), LineClass::Body { .. }));
    assert!(matches!(classifier.classify("9-4. inverted"), LineClass::Body { .. }));
}

#[test]
fn chapter_title_line_is_never_section_one() {
    let classifier = classifier();
    let lines = ["1. Mūlapariyāyavaggo", "2. Dutiyasuttaṃ", "Evaṃ me sutaṃ."];

    let segments = segment_channel(&classifier, &lines);

    assert_eq!(segments.title, "Mūlapariyāyavaggo");
    assert_eq!(segments.sections.len(), 1);
    assert_eq!(segments.sections[0].number, 2);
    assert_eq!(segments.sections[0].title.as_deref(), Some("Dutiyasuttaṃ"));
    assert_eq!(segments.sections[0].body, vec!["Evaṃ me sutaṃ.".to_string()]);
}

#[test]
fn state_machine_tracks_titles_vaggas_and_absorbed_parts() {
    let classifier = classifier();
    let block = extract_chapter_block(PALI, "Mūlapariyāyavaggo", Some("Sīhanādavaggo"), Language::Pali)
        .expect("block");

    let segments = segment_channel(&classifier, &block);

    let numbers = segments
        .sections
        .iter()
        .map(|section| section.number)
        .collect::<Vec<u32>>();
    assert_eq!(numbers, vec![1, 2, 4]);

    let first = &segments.sections[0];
    assert_eq!(first.title.as_deref(), Some("Mūlapariyāyasuttaṃ"));
    assert_eq!(first.body.len(), 2);
    assert_eq!(first.vagga.as_deref(), Some("Paṭhamavaggo"));

    let second = &segments.sections[1];
    assert!(second.title.is_none());
    assert_eq!(second.absorbed, vec![(3, "Tatiyasuttaṃ".to_string())]);
    assert_eq!(second.body.last().map(String::as_str), Some("Tatiya body."));

    let fourth = &segments.sections[2];
    assert_eq!(fourth.title.as_deref(), Some("Sabbāsavasuttaṃ"));
    assert_eq!(fourth.body, vec!["Evaṃ me sutaṃ.".to_string()]);
    assert_eq!(fourth.vagga.as_deref(), Some("Paṭhamavaggo"));

    assert_eq!(segments.footer, vec!["Mūlapariyāyasuttaṃ niṭṭhitaṃ paṭhamaṃ.".to_string()]);
    assert_eq!(segments.ignored_lines, 0);
}

#[test]
fn dangling_title_and_stray_lines() {
    let classifier = classifier();
    let lines = [
        "1. Opammavaggo",
        "text before any section",
        "(4) Catutthasuttaṃ",
        "5-7. Tīṇi suttāni",
        "8. Aṭṭhamasuttaṃ",
        "9. Navamasuttaṃ",
    ];

    let segments = segment_channel(&classifier, &lines);

    assert_eq!(segments.ignored_lines, 2);
    let summary = segments
        .sections
        .iter()
        .map(|section| (section.number, section.number_range.clone(), section.title.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            (5, Some("5-7".to_string()), None),
            (8, None, Some("Aṭṭhamasuttaṃ".to_string())),
            (9, None, Some("Navamasuttaṃ".to_string())),
        ]
    );
    assert!(segments.sections[2].body.is_empty());
}

#[test]
fn duplicate_numbers_are_kept_for_the_reconciler() {
    let classifier = classifier();
    let lines = ["1. Opammavaggo", "5. a", "6. b", "6. c", "7. d"];

    let segments = segment_channel(&classifier, &lines);

    assert_eq!(segments.sections.len(), 4);
    assert_eq!(segments.duplicate_numbers(), 1);
}

#[test]
fn channels_merge_on_number_and_occurrence() {
    let classifier = classifier();
    let pali = segment_channel(&classifier, &["1. Vaggo", "6. first", "6. second", "7. x"]);
    let english = segment_channel(
        &classifier,
        &["1. Chapter", "6. first en", "6. second en", "8. extra"],
    );

    let merged = merge_channels(&pali, &[(Language::English, english)]);

    assert_eq!(merged.title.pali, "Vaggo");
    assert_eq!(merged.title.english, "Chapter");
    assert_eq!(merged.sections[0].english, "first en");
    assert_eq!(merged.sections[1].english, "second en");
    assert_eq!(merged.sections[2].english, "");
    assert_eq!(merged.dropped, vec![(Language::English, 8)]);
    assert!(merged.footer.is_none());
}

#[test]
fn chapter_ids_fold_diacritics_and_honor_manifest_ids() {
    let normalizer = TextNormalizer::new(&SuffixRules::default()).expect("normalizer should build");
    assert_eq!(slugify("Mūlapariyāyavaggo"), "mulapariyayavaggo");
    assert_eq!(slugify("Cūḷa Sīhanāda-suttaṃ"), "cula-sihanada-suttam");

    let derived = entry("Mūlapariyāyavaggo", None, None);
    assert_eq!(
        chapter_id(&normalizer, "mn", &derived, "Mūlapariyāyavaggo", 0),
        "mn-mulapariyayavaggo"
    );

    let pinned = ChapterEntry {
        id: Some("mn-1".to_string()),
        ..derived.clone()
    };
    assert_eq!(chapter_id(&normalizer, "mn", &pinned, "anything", 0), "mn-1");

    let sinhala_only = entry("මූලපරියාය", None, None);
    assert_eq!(
        chapter_id(&normalizer, "mn", &sinhala_only, "මූලපරියාය", 4),
        "mn-chapter-5"
    );
}

#[test]
fn escaped_joiners_never_reach_chapter_ids() {
    let normalizer = TextNormalizer::new(&SuffixRules::default()).expect("normalizer should build");
    let derived = entry("Mūlapariyāyavaggo", None, None);

    for title in ["Mūla&zwj;pariyāyavaggo", "Mūla#ZWJ;pariyāyavaggo", "Mūla\u{200D}pariyāyavaggo"] {
        assert_eq!(
            chapter_id(&normalizer, "mn", &derived, title, 0),
            "mn-mulapariyayavaggo",
            "title {title:?}"
        );
    }

    let escaped_marker = entry("&zwnj;", None, None);
    assert_eq!(
        chapter_id(&normalizer, "mn", &escaped_marker, "", 2),
        "mn-chapter-3"
    );

    let classifier = classifier();
    let texts = BookTexts {
        pali: "1. Mūla&zwj;pariyāyavaggo\n1. Evaṃ me sutaṃ.\n".to_string(),
        english: None,
        sinhala: None,
    };
    let segmented = segment_chapter(
        &classifier,
        &texts,
        "mn",
        &entry("Mūla&zwj;pariyāyavaggo", None, None),
        None,
        0,
        &SegmenterConfig::default(),
    )
    .expect("escaped title segments");
    assert_eq!(segmented.chapter.id, "mn-mulapariyayavaggo");
}

#[test]
fn segment_chapter_merges_channels_and_reports_divergence() {
    let classifier = classifier();
    let texts = texts();
    let first = entry("Mūlapariyāyavaggo", Some("The Chapter on the Root"), Some(3));
    let second = entry("Sīhanādavaggo", Some("The Chapter on the Lion"), Some(10));

    let segmented = segment_chapter(
        &classifier,
        &texts,
        "mn",
        &first,
        Some(&second),
        0,
        &SegmenterConfig::default(),
    )
    .expect("first chapter segments");

    let chapter = &segmented.chapter;
    assert_eq!(chapter.id, "mn-mulapariyayavaggo");
    assert_eq!(chapter.title.english, "The Chapter on the Root");
    assert_eq!(chapter.sections.len(), 3);
    assert_eq!(chapter.sections[0].english, "Thus have I heard.");
    assert_eq!(
        chapter.sections[0].english_title.as_deref(),
        Some("The Root of All Things Discourse")
    );
    assert_eq!(
        chapter.sections[1].absorbed[0].title.english,
        "The Third Discourse"
    );
    assert_eq!(
        segmented.issues,
        vec![(
            IssueKind::ChannelDivergence,
            "english section 9 has no pali counterpart and was dropped".to_string(),
        )]
    );

    let last = segment_chapter(
        &classifier,
        &texts,
        "mn",
        &second,
        None,
        1,
        &SegmenterConfig::default(),
    )
    .expect("second chapter segments");
    assert_eq!(last.chapter.sections.len(), 1);
    assert_eq!(
        last.chapter.sections[0].english_title.as_deref(),
        Some("The Shorter Lion's Roar Discourse")
    );
    assert!(
        last.issues
            .iter()
            .any(|(kind, _)| *kind == IssueKind::SectionCountDivergence)
    );
}

#[test]
fn missing_secondary_marker_blanks_only_that_channel() {
    let classifier = classifier();
    let texts = texts();
    let first = entry("Mūlapariyāyavaggo", Some("No Such Chapter"), None);

    let segmented = segment_chapter(
        &classifier,
        &texts,
        "mn",
        &first,
        Some(&entry("Sīhanādavaggo", Some("The Chapter on the Lion"), None)),
        0,
        &SegmenterConfig::default(),
    )
    .expect("pali still segments");

    assert_eq!(segmented.chapter.sections.len(), 3);
    assert!(segmented.chapter.sections.iter().all(|section| section.english.is_empty()));
    assert_eq!(segmented.issues.len(), 1);
    assert_eq!(segmented.issues[0].0, IssueKind::MissingChapterMarker);
}

#[test]
fn run_writes_reconciled_normalized_chapter_documents() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::create_dir_all(root.join("raw")).expect("create raw");
    fs::write(root.join("raw/mn.pali.txt"), PALI.replace("Tatiya body.", "Tatiya#zwj; body."))
        .expect("write pali");
    fs::write(root.join("raw/mn.english.txt"), ENGLISH).expect("write english");
    write_json_pretty(
        &root.join("books/mn.json"),
        &serde_json::json!({
            "collection": "sutta",
            "book": "mn",
            "title": "Majjhimanikāyo",
            "sources": { "pali": "raw/mn.pali.txt", "english": "raw/mn.english.txt" },
            "chapters": [
                { "marker": { "pali": "Mūlapariyāyavaggo", "english": "The Chapter on the Root" },
                  "expected_sections": 3 },
                { "marker": { "pali": "Sīhanādavaggo", "english": "The Chapter on the Lion" } },
                { "marker": { "pali": "Opammavaggo" } }
            ]
        }),
    )
    .expect("write manifest");

    let report_path = root.join("segment_report.json");
    run(
        SegmentArgs {
            corpus_root: root.to_path_buf(),
            books: Vec::new(),
            report_path: Some(report_path.clone()),
        },
        &PipelineConfig::default(),
    )
    .expect("segment run");

    let chapter = Chapter::load(&chapter_path(root, "mn", "mn-mulapariyayavaggo"))
        .expect("first chapter document");
    let numbers = chapter
        .sections
        .iter()
        .map(|section| section.number)
        .collect::<Vec<u32>>();
    assert_eq!(numbers, vec![1, 2, 4]);

    let second = &chapter.sections[1];
    assert_eq!(second.number_range.as_deref(), Some("2-3"));
    assert_eq!(second.pali_title.as_deref(), Some("Tatiyasuttaṃ"));
    assert_eq!(second.english_title.as_deref(), Some("The Third Discourse"));
    assert!(second.absorbed.is_empty());
    assert!(second.pali.ends_with("Tatiya\u{200D} body."));

    assert_eq!(chapter.sections[0].vagga.as_deref(), Some("Paṭhamavaggo"));
    assert!(chapter.sections[1].vagga.is_none());
    assert!(chapter.sections[2].vagga.is_none());

    assert!(chapter_path(root, "mn", "mn-sihanadavaggo").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("read report"))
            .expect("parse report");
    assert_eq!(manifest["summary"]["chapters"]["processed"], 3);
    assert_eq!(manifest["summary"]["chapters"]["fixed"], 2);
    assert_eq!(manifest["summary"]["chapters"]["failed"], 1);
    assert_eq!(manifest["issue_counts"]["missing_chapter_marker"], 1);
    assert_eq!(manifest["summary"]["unicode_anomalies"]["fixed"], 1);
}

#[test]
fn run_skips_second_chapter_with_the_same_id() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::create_dir_all(root.join("raw")).expect("create raw");
    fs::write(
        root.join("raw/an.pali.txt"),
        "1. Ekakavaggo\n1. a\n2. Ekakavaggo\n1. b\n",
    )
    .expect("write pali");
    write_json_pretty(
        &root.join("books/an.json"),
        &serde_json::json!({
            "collection": "sutta",
            "book": "an",
            "sources": { "pali": "raw/an.pali.txt" },
            "chapters": [
                { "id": "an-1", "marker": { "pali": "Ekakavaggo" } },
                { "id": "an-1", "marker": { "pali": "Ekakavaggo" } }
            ]
        }),
    )
    .expect("write manifest");

    let report_path = root.join("report.json");
    run(
        SegmentArgs {
            corpus_root: root.to_path_buf(),
            books: vec!["an".to_string()],
            report_path: Some(report_path.clone()),
        },
        &PipelineConfig::default(),
    )
    .expect("segment run");

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("read report"))
            .expect("parse report");
    assert_eq!(manifest["issue_counts"]["duplicate_chapter_id"], 1);
    assert_eq!(manifest["summary"]["chapters"]["skipped"], 1);
}
