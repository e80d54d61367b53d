use crate::corpus::{segment_stream, Corpus, SegmentStats};
use crate::scorer::Scorer;
use crate::segmenter::CompoundDictionary;
use crate::tests::model_dir::load_text_model;

const COMPOUND: &str = include_str!("./resources/compound.txt");
const CORPUS: &str = include_str!("./resources/corpus.txt");

#[test]
fn test_stream_matches_corpus_segment() {
    let dict = CompoundDictionary::from_reader(COMPOUND.as_bytes()).unwrap();
    assert_eq!(3, dict.num_entries());
    assert_eq!(3, dict.max_span());

    let mut output = vec![];
    let stats = segment_stream(&dict, CORPUS.as_bytes(), &mut output).unwrap();
    assert_eq!(
        SegmentStats {
            documents: 2,
            sentences: 3,
            tokens_in: 19,
            tokens_out: 16,
        },
        stats
    );

    let streamed = Corpus::from_reader(output.as_slice()).unwrap();
    let segmented = Corpus::from_reader(CORPUS.as_bytes())
        .unwrap()
        .segment(&dict);
    assert_eq!(segmented, streamed);
    assert_eq!(
        vec!["the", "bank", "in", "new_york_city", "holds", "money"],
        streamed.documents()[0].sentence_words()[1]
    );
}

#[test]
fn test_segmented_corpus_is_stable() {
    let dict = CompoundDictionary::from_reader(COMPOUND.as_bytes()).unwrap();
    let once = Corpus::from_reader(CORPUS.as_bytes())
        .unwrap()
        .segment(&dict);
    assert_eq!(once, once.segment(&dict));
}

#[test]
fn test_annotate_segmented_corpus() {
    let dict = CompoundDictionary::from_reader(COMPOUND.as_bytes()).unwrap();
    let corpus = Corpus::from_reader(CORPUS.as_bytes())
        .unwrap()
        .segment(&dict);
    let scorer = Scorer::new(load_text_model());
    let mut worker = scorer.new_worker();

    // `river bank` is merged into an untagged compound, so only the second
    // sentence of the first document carries a taggable `bank`.
    let annotations = worker.annotate(&corpus.documents()[0], 5, false).unwrap();
    assert_eq!(1, annotations.len());
    assert_eq!(
        (1, 1, "bank.n.02"),
        (annotations[0].sentence, annotations[0].token, annotations[0].sense.as_str())
    );
    let expected = 1.0f64.exp() / (1.0 + 1.0f64.exp());
    assert!((annotations[0].probability - expected).abs() < 1e-6);

    let annotations = worker.annotate(&corpus.documents()[1], 5, true).unwrap();
    let senses: Vec<_> = annotations
        .iter()
        .map(|a| (a.token, a.sense.as_str()))
        .collect();
    assert_eq!(vec![(1, "bank.v.01"), (4, "bank.n.01")], senses);
    assert!((annotations[1].probability - 0.6).abs() < 1e-6);
}
