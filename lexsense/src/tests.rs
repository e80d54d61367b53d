//! lexsenseの結合テスト群
//!
//! 語彙・埋め込みの読み込み、複合語の分割、定義文グラフの重み付けを
//! 組み合わせた動作を検証します。

mod segmentation;
