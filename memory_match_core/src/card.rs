use crate::error::DeckError;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 一局游戏中的配对数量
pub const TOTAL_PAIRS: usize = 8;
/// 一副牌的张数 (每个符号两张)
pub const DECK_SIZE: usize = TOTAL_PAIRS * 2;

// --- 核心数据结构定义 ---

/// 卡面符号 (Symbol)
/// 一副牌里每个符号恰好出现两次。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Symbol {
    GameController, // 🎮
    Dice,           // 🎲
    Target,         // 🎯
    Circus,         // 🎪
    Art,            // 🎨
    Theater,        // 🎭
    Puzzle,         // 🧩
    Joystick,       // 🕹️
}

impl Symbol {
    pub const ALL: [Symbol; TOTAL_PAIRS] = [
        Symbol::GameController,
        Symbol::Dice,
        Symbol::Target,
        Symbol::Circus,
        Symbol::Art,
        Symbol::Theater,
        Symbol::Puzzle,
        Symbol::Joystick,
    ];

    /// 卡面上显示的 emoji
    pub fn glyph(self) -> &'static str {
        match self {
            Symbol::GameController => "🎮",
            Symbol::Dice => "🎲",
            Symbol::Target => "🎯",
            Symbol::Circus => "🎪",
            Symbol::Art => "🎨",
            Symbol::Theater => "🎭",
            Symbol::Puzzle => "🧩",
            Symbol::Joystick => "🕹️",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Symbol::GameController => "Game Controller",
            Symbol::Dice => "Dice",
            Symbol::Target => "Target",
            Symbol::Circus => "Circus",
            Symbol::Art => "Art",
            Symbol::Theater => "Theater",
            Symbol::Puzzle => "Puzzle",
            Symbol::Joystick => "Joystick",
        }
    }
}

/// 卡牌状态 (CardStatus)
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum CardStatus {
    Hidden,   // 背面朝上
    Revealed, // 已翻开，等待判定
    Matched,  // 已配对，保持正面朝上
}

/// 单张卡牌 (Card)
/// `index` 和 `symbol` 创建后不再改变，只有 `status` 会随游戏推进而变化。
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub index: usize,
    pub symbol: Symbol,
    pub status: CardStatus,
}

impl Card {
    pub fn new(index: usize, symbol: Symbol) -> Card {
        Card { index, symbol, status: CardStatus::Hidden }
    }

    pub fn is_face_up(&self) -> bool {
        self.status != CardStatus::Hidden
    }
}

/// 一副洗好的牌 (Deck)
///
/// 不变量：共 16 张，8 个符号各恰好两张。只能通过 [`Deck::shuffled`]
/// 或经过校验的 [`Deck::from_symbols`] 构造。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

// --- 实现辅助功能 ---

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.status {
            CardStatus::Hidden => write!(f, "#{}(?)", self.index),
            _ => write!(f, "#{}({})", self.index, self.symbol),
        }
    }
}

// --- 随机牌组生成 ---

/// 每个符号复制一份，得到未洗的 16 张牌面
fn paired_symbols() -> Vec<Symbol> {
    Symbol::ALL.iter().chain(Symbol::ALL.iter()).copied().collect()
}

impl Deck {
    /// 生成一副新牌并均匀洗牌
    ///
    /// `SliceRandom::shuffle` 是 Fisher–Yates 洗牌，每种排列出现的概率相同。
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Deck {
        let mut symbols = paired_symbols();
        symbols.shuffle(rng);
        Deck::build(symbols)
    }

    /// 按给定顺序摆牌，校验每个符号恰好两张
    pub fn from_symbols(symbols: &[Symbol]) -> Result<Deck, DeckError> {
        if symbols.len() != DECK_SIZE {
            return Err(DeckError::WrongSize { expected: DECK_SIZE, actual: symbols.len() });
        }
        for symbol in Symbol::ALL {
            let count = symbols.iter().filter(|s| **s == symbol).count();
            if count != 2 {
                return Err(DeckError::UnbalancedSymbol { symbol, count });
            }
        }
        Ok(Deck::build(symbols.to_vec()))
    }

    fn build(symbols: Vec<Symbol>) -> Deck {
        let cards = symbols
            .into_iter()
            .enumerate()
            .map(|(index, symbol)| Card::new(index, symbol))
            .collect();
        Deck { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Card> {
        self.cards.get_mut(index)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.cards.iter().map(|c| c.symbol).collect()
    }

    /// 找到与 `index` 处卡牌同符号的另一张牌的位置
    pub fn partner_of(&self, index: usize) -> Option<usize> {
        let symbol = self.cards.get(index)?.symbol;
        self.cards
            .iter()
            .position(|c| c.symbol == symbol && c.index != index)
    }
}

// --- 单元测试 ---
