/*!

This is the long-form manual for `results_normalizer` and `elnorm`.

## Output

A single CSV file with the header

```text
county,precinct,office,district,party,candidate,votes
```

with one row per precinct and candidate. Missing districts and offices are
empty fields. County-level sources have an empty precinct.

## Input formats

### `pdf`

Precinct reports printed as one table per contest, spread over one or more
pages. The tables are extracted beforehand by a PDF table extraction tool,
which reads three rectangular regions on every page:

* the label region, holding the name of the contest (`D5 REPRESENTATIVE`)
* the header region, holding the candidate names, possibly over several lines
* the content region, holding one row per precinct

The extracted cells are handed over as a JSON grid dump:

```text
{ "pages": [
    { "page": 3,
      "label": [["D5", "REPRESENTATIVE"]],
      "header": [["SMITH, JOHN", "%", "DOE, JANE", "%"], ["(DEM)", null, "(REP)", null]],
      "content": [["ASHMORE 1", "10", "50%", "10", "50%"]] } ] }
```

The scrape configuration describes the document:

```text
{
  "areas": {
    "label":   { "left": 37.56, "top": 136, "width": 527.65, "height": 30 },
    "header":  { "left": 37.56, "top": 157, "width": 527.65, "height": 50 },
    "content": { "left": 34.89, "top": 137.18, "width": 527.65, "height": 640.11 }
  },
  "pdf": "2012 nov 6 il edgar.pdf",
  "extractedGrids": "edgar_grids.json",
  "pages": [1, 3, 4, 5],
  "county": "Edgar",
  "headers": { "1": ["Reg. Voters", "Cards Cast", "% Turnout"] },
  "labels": { "1": "TURN OUT" }
}
```

`headers` and `labels` override what is read on a given page. Pages that share
a label are one contest: their tables are concatenated, and a candidate that
only appears on some of the pages is kept.

Columns of percentages are dropped. When the extractor left the count and the
percentage in the same cell (`45 (52%)`), only the count is kept.

### `flat`

A directory of delimited exports from the state board of elections. Two
vintages are recognized from their header:

* precinct results, comma separated:
  `JurisName,CandidateName,PrecinctName,PartyName,VoteCount,ContestName,EISContestID`
* county totals, tab separated:
  `County,OfficeName,PartyAbbrev,CanFirstName,CanLastName,Votes`

In the precinct results, rows without a `ContestName` take the name of another
row with the same `EISContestID`. Party names must be known spellings: an
unknown spelling stops the run, and must be added to
[`crate::vocabulary::PARTIES`].

 */
