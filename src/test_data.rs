pub const POST_HELLO_WORLD: &str = "<!-- hello-world -->
# Hello World
Body text.
";

pub const POST_WITH_SUMMARY: &str = "<!-- what-i-learned -->
# What I learned after 20+ years of software development
How to be a great software engineer?

Someone asked me this question today and I didn’t have an answer. After thinking for a while, I came up with a list of what I try to do myself.

<!-- more -->

## Non technical

### Have a honest image of yourself

You finished university and learned a lot. You solved many hard problems.
";

pub const COMMENT_DATA: &str = "Alice
alice@example.org
1577872800000000000
Great read.

Thanks for *sharing*.";
